//! Storage adapters implementing the meeting store port.

pub mod memory;

pub use memory::InMemoryMeetingStore;

pub mod event;
pub mod typewriter;

pub mod entities;
pub mod profile;
pub mod scoring;

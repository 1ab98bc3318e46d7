pub mod entities;
pub mod mode;

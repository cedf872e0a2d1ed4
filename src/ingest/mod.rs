pub mod handler;
pub mod types;
pub mod validate;

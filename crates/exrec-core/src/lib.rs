pub mod config;
pub mod error;
pub mod listing;
pub mod session;
pub mod validation;

// Re-export common error type
pub use error::{ExrecError, Result};

//! Configuration validation
//!
//! Validates quantizer configurations for correctness before a run.

mod error;
mod validator;

#[cfg(test)]
mod proptests;

pub use error::ValidationError;
pub use validator::validate_config;

//! Error types for p2c-core.

use thiserror::Error;

/// Result type for p2c-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in p2c-core.
///
/// Compiler failures are not errors at this level: they are reported as a
/// [`CompilationOutcome`](crate::CompilationOutcome) variant.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration variable held a value that could not be parsed.
    #[error("invalid value for {key}: {message}")]
    Config { key: &'static str, message: String },
}

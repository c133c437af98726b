//! CLI command implementations
//!
//! The Command pattern interface the CLI entry point drives, and the
//! redaction command itself.

pub mod redact_command;

pub use redact_command::RedactCommand;

use crate::errors::RedactResult;

/// Represents an executable command in the application
pub trait Command {
    /// Execute the command
    ///
    /// # Returns
    /// Result indicating success or an error
    fn execute(&self) -> RedactResult<()>;
}

//! Slide redaction command
//!
//! Iterates the files named on the command line, dispatching each to
//! the format handlers. A file that fails is reported to stderr as
//! `<filename>: <message>` and processing continues; the command as a
//! whole fails if any file did.

use clap::ArgMatches;
use std::path::Path;

use crate::commands::Command;
use crate::errors::{RedactError, RedactResult};
use crate::formats;

/// Command for redacting one or more slide files
pub struct RedactCommand {
    /// Files to redact, in command-line order
    files: Vec<String>,
}

impl RedactCommand {
    /// Create a new redact command from CLI arguments
    pub fn new(args: &ArgMatches) -> RedactResult<Self> {
        let files: Vec<String> = args
            .get_many::<String>("files")
            .ok_or_else(|| RedactError::GenericError("specify a file".to_string()))?
            .cloned()
            .collect();
        Ok(RedactCommand {
            files: expand_patterns(files),
        })
    }
}

/// Expands glob patterns on Windows, where the shell leaves them to us
///
/// A pattern with no matches is passed through untouched so the error
/// message names what the user typed.
#[cfg(windows)]
fn expand_patterns(args: Vec<String>) -> Vec<String> {
    let mut files = Vec::new();
    for arg in args {
        let mut matched = false;
        if let Ok(paths) = glob::glob(&arg) {
            for path in paths.flatten() {
                files.push(path.display().to_string());
                matched = true;
            }
        }
        if !matched {
            files.push(arg);
        }
    }
    files
}

/// On other platforms the shell has already expanded the patterns
#[cfg(not(windows))]
fn expand_patterns(args: Vec<String>) -> Vec<String> {
    args
}

impl Command for RedactCommand {
    fn execute(&self) -> RedactResult<()> {
        let mut failures = 0usize;
        for filename in &self.files {
            println!("{}", filename);
            if let Err(e) = formats::anonymize_slide(Path::new(filename)) {
                eprintln!("{}: {}", filename, e);
                failures += 1;
            }
        }
        if failures > 0 {
            return Err(RedactError::GenericError(format!(
                "failed to redact {} of {} files",
                failures,
                self.files.len()
            )));
        }
        Ok(())
    }
}

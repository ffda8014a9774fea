//! CLI command implementations
//!
//! This module contains implementations of the commands
//! supported by the CLI application using the Command pattern.

pub mod command_traits;
pub mod extract_command;

pub use command_traits::{Command, CommandFactory};
pub use extract_command::ExtractCommand;

use clap::ArgMatches;
use crate::errors::{CodexError, CodexResult};
use crate::utils::logger::Logger;

/// Factory for creating command instances based on CLI arguments
///
/// This factory examines the subcommand given on the command line and
/// creates the matching command instance for execution.
pub struct CodexCommandFactory;

impl CodexCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        CodexCommandFactory
    }
}

impl Default for CodexCommandFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CommandFactory<'a> for CodexCommandFactory {
    fn create_command(&self, args: &ArgMatches, logger: &'a Logger) -> CodexResult<Box<dyn Command + 'a>> {
        match args.subcommand() {
            Some(("extract", sub_args)) => Ok(Box::new(ExtractCommand::new(args, sub_args, logger)?)),
            Some((other, _)) => Err(CodexError::ConfigError(format!("Unknown command: {}", other))),
            None => Err(CodexError::ConfigError("No command given, try `codexkit extract --help`".to_string())),
        }
    }
}

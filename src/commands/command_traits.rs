//! Command interfaces of the CLI
//!
//! Each subcommand parses its arguments up front into a `Command`; the
//! factory picks the command from the clap matches.

use crate::utils::logger::Logger;
use crate::errors::CodexResult;

/// A parsed subcommand, ready to run
pub trait Command {
    /// Run the command to completion
    fn execute(&self) -> CodexResult<()>;
}

/// Builds the command selected on the command line
pub trait CommandFactory<'a> {
    /// Create the command for the given matches
    ///
    /// # Arguments
    /// * `args` - Top-level argument matches, including the subcommand
    /// * `logger` - Logger receiving operation summaries
    ///
    /// # Returns
    /// The boxed command, or an error for missing or unknown subcommands
    /// and invalid arguments
    fn create_command(&self, args: &clap::ArgMatches, logger: &'a Logger) -> CodexResult<Box<dyn Command + 'a>>;
}

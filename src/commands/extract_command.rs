//! Channel extraction command
//!
//! This module implements the command that extracts channels and z planes
//! of selected tiles into one hyperstack per tile location.

use clap::ArgMatches;
use log::info;
use std::path::PathBuf;

use crate::api::run_extraction;
use crate::commands::command_traits::Command;
use crate::config::EXPERIMENT_FILE;
use crate::errors::{CodexError, CodexResult};
use crate::extract::ExtractRequest;
use crate::utils::logger::Logger;

/// Environment variable naming the default data directory
pub const DATA_DIR_ENV: &str = "CODEX_DATA_DIR";

/// Command for extracting channels from the tiles of an experiment
pub struct ExtractCommand<'a> {
    /// Experiment data directory
    data_dir: PathBuf,
    /// Experiment configuration file
    config_path: PathBuf,
    /// Extraction parameters
    request: ExtractRequest,
    /// Compression of the written stacks
    compression: String,
    /// Logger for recording operations
    logger: &'a Logger,
}

impl<'a> ExtractCommand<'a> {
    /// Create a new extract command
    ///
    /// # Arguments
    /// * `args` - Top-level CLI argument matches (global options)
    /// * `sub_args` - Argument matches of the `extract` subcommand
    /// * `logger` - Logger for recording operations
    ///
    /// # Returns
    /// A new ExtractCommand instance or an error
    pub fn new(args: &ArgMatches, sub_args: &ArgMatches, logger: &'a Logger) -> CodexResult<Self> {
        info!("Creating new extract command from arguments");

        let data_dir = global_arg(args, sub_args, "data-dir")
            .or_else(|| std::env::var(DATA_DIR_ENV).ok())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        info!("Data directory: {}", data_dir.display());

        let config_path = global_arg(args, sub_args, "config")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(EXPERIMENT_FILE));
        info!("Experiment configuration: {}", config_path.display());

        let name = sub_args.get_one::<String>("name")
            .ok_or_else(|| CodexError::ConfigError("Missing extraction name".to_string()))?
            .clone();

        let channels: Vec<String> = sub_args.get_many::<String>("channels")
            .map(|values| values.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()).collect())
            .unwrap_or_default();
        if channels.is_empty() {
            return Err(CodexError::ConfigError("At least one channel must be given with --channels".to_string()));
        }
        info!("Channels: {:?}", channels);

        let z = sub_args.get_one::<String>("z")
            .cloned()
            .unwrap_or_else(|| "best".to_string());
        info!("Z planes: {}", z);

        let region_indexes = sub_args.get_one::<String>("region-indexes").cloned();
        let tile_indexes = sub_args.get_one::<String>("tile-indexes").cloned();
        info!("Region indexes: {:?}, tile indexes: {:?}", region_indexes, tile_indexes);

        let compression = sub_args.get_one::<String>("compression")
            .cloned()
            .unwrap_or_else(|| "none".to_string());

        Ok(ExtractCommand {
            data_dir,
            config_path,
            request: ExtractRequest {
                name,
                channels,
                z,
                region_indexes,
                tile_indexes,
            },
            compression,
            logger,
        })
    }

    pub fn request(&self) -> &ExtractRequest {
        &self.request
    }
}

/// Global options may be given before or after the subcommand name
fn global_arg(args: &ArgMatches, sub_args: &ArgMatches, id: &str) -> Option<String> {
    sub_args.get_one::<String>(id)
        .or_else(|| args.get_one::<String>(id))
        .cloned()
}

impl<'a> Command for ExtractCommand<'a> {
    fn execute(&self) -> CodexResult<()> {
        let summary = run_extraction(
            &self.data_dir,
            &self.config_path,
            &self.request,
            &self.compression,
            true,
            self.logger
        )?;

        println!("Extracted {} tiles to {}", summary.tiles_written, summary.output_dir.display());
        Ok(())
    }
}

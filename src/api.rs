use std::path::{Path, PathBuf};
use log::info;
use crate::codex::{BestFocusFile, CytometryChannels, FsTileGenerator, HyperstackTileWriter, OverlapCrop};
use crate::codex::paths::BEST_FOCUS_FILE;
use crate::compression::CompressionFactory;
use crate::config::{ExperimentConfig, EXPERIMENT_FILE};
use crate::errors::CodexResult;
use crate::extract::{ExperimentView, ExtractRequest, ExtractSummary, Extractor, TileIo};
use crate::utils::logger::Logger;

/// Main interface to the CodexKit library
pub struct CodexKit {
    data_dir: PathBuf,
    config_path: PathBuf,
    logger: Logger,
}

impl CodexKit {
    /// Create a new CodexKit instance
    ///
    /// # Arguments
    /// * `data_dir` - Experiment data directory
    /// * `log_file` - Optional path to log file, defaults to "codexkit.log"
    ///
    /// # Returns
    /// A CodexKit instance or an error if the log file cannot be created
    pub fn new(data_dir: &Path, log_file: Option<&str>) -> CodexResult<Self> {
        let log_path = log_file.unwrap_or("codexkit.log");
        let logger = Logger::new(log_path)?;
        Ok(CodexKit {
            data_dir: data_dir.to_path_buf(),
            config_path: data_dir.join(EXPERIMENT_FILE),
            logger,
        })
    }

    /// Read the experiment configuration from another file
    pub fn with_config(mut self, config_path: &Path) -> Self {
        self.config_path = config_path.to_path_buf();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load the experiment configuration
    pub fn config(&self) -> CodexResult<ExperimentConfig> {
        ExperimentConfig::load(&self.config_path)
    }

    /// Extract channels and z planes into one hyperstack per tile location
    ///
    /// # Arguments
    /// * `name` - Name of the extraction, used as the output directory name
    /// * `channels` - Prefixed channel names such as `raw_DAPI` or `cyto_cell_mask`
    /// * `z` - `best`, `all` or a 1-based z index expression
    /// * `region_indexes` - Optional 1-based region index expression
    /// * `tile_indexes` - Optional 1-based tile index expression
    /// * `compression` - Compression of the written stacks: none, deflate or zstd
    ///
    /// # Returns
    /// The output directory and the number of tiles written
    pub fn extract(&self,
                   name: &str,
                   channels: &[&str],
                   z: &str,
                   region_indexes: Option<&str>,
                   tile_indexes: Option<&str>,
                   compression: &str) -> CodexResult<ExtractSummary> {
        let request = ExtractRequest {
            name: name.to_string(),
            channels: channels.iter().map(|c| c.to_string()).collect(),
            z: z.to_string(),
            region_indexes: region_indexes.map(str::to_string),
            tile_indexes: tile_indexes.map(str::to_string),
        };
        self.run(&request, compression, false)
    }

    /// Run a prepared extraction request
    pub fn run(&self, request: &ExtractRequest, compression: &str, show_progress: bool) -> CodexResult<ExtractSummary> {
        run_extraction(&self.data_dir, &self.config_path, request, compression, show_progress, &self.logger)
    }
}

/// Assemble the file-system pipeline of an experiment and run one extraction
///
/// # Arguments
/// * `data_dir` - Experiment data directory
/// * `config_path` - Path of the experiment configuration
/// * `request` - Extraction name, channels, z selector and tile filters
/// * `compression` - Compression of the written stacks
/// * `show_progress` - Whether to draw a progress bar
/// * `logger` - Logger receiving the operation summary
pub fn run_extraction(data_dir: &Path,
                      config_path: &Path,
                      request: &ExtractRequest,
                      compression: &str,
                      show_progress: bool,
                      logger: &Logger) -> CodexResult<ExtractSummary> {
    let handler = CompressionFactory::get_handler_by_name(compression)?;
    let config = ExperimentConfig::load(config_path)?;
    info!("Experiment has {} regions, {} cycles, {} channels per cycle",
          config.n_regions(), config.n_cycles(), config.n_channels_per_cycle);

    let cytometry = CytometryChannels;
    let focus = BestFocusFile::new(&data_dir.join(BEST_FOCUS_FILE));
    let generator = FsTileGenerator::new(data_dir, &config);
    let cropper = OverlapCrop::from_config(&config);
    let writer = HyperstackTileWriter::new(handler, logger);

    let extractor = Extractor::new(
        data_dir,
        ExperimentView {
            channels: &config,
            cytometry: &cytometry,
            focus: &focus,
            locations: config.tile_locations(),
        },
        TileIo {
            generator: &generator,
            cropper: &cropper,
            writer: &writer,
        },
    ).with_progress(show_progress);

    let summary = extractor.run(request)?;
    logger.log(&format!(
        "Extraction \"{}\" of channels {:?} (z = {}) wrote {} tiles to {}",
        request.name, request.channels, request.z, summary.tiles_written, summary.output_dir.display()
    ))?;

    Ok(summary)
}

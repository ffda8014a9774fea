//! Experiment configuration
//!
//! Loads `experiment.toml` from the data directory. The file is parsed into
//! a `toml::Value` and walked by hand so every missing or mistyped key can be
//! reported by name.

use std::fmt;
use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::errors::{CodexError, CodexResult};
use crate::extract::channels::ChannelLookup;
use crate::extract::locations::TileLocation;

/// Default experiment file name inside the data directory
pub const EXPERIMENT_FILE: &str = "experiment.toml";

/// Default raw plane file name template, relative to the data directory
pub const DEFAULT_RAW_TEMPLATE: &str = "Cyc{cycle}_reg{region}/{region}_{tile:05}_Z{z:03}_CH{channel}.tif";

/// Order in which tiles were acquired within a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilingMode {
    /// Row-major, every row left to right
    Grid,
    /// Row-major, odd rows right to left
    Snake,
}

impl TilingMode {
    /// Parse a tiling mode name, case-insensitively
    pub fn from_name(name: &str) -> CodexResult<Self> {
        match name.to_lowercase().as_str() {
            "grid" => Ok(TilingMode::Grid),
            "snake" => Ok(TilingMode::Snake),
            other => Err(CodexError::ConfigError(format!(
                "experiment.tiling_mode must be \"grid\" or \"snake\" (given = \"{}\")", other
            ))),
        }
    }

    /// 0-based (x, y) of a tile index within a region `region_width` tiles wide
    pub fn coordinates(&self, tile_index: usize, region_width: usize) -> (usize, usize) {
        let y = tile_index / region_width;
        let x = tile_index % region_width;
        match self {
            TilingMode::Snake if y % 2 == 1 => (region_width - x - 1, y),
            _ => (x, y),
        }
    }
}

impl fmt::Display for TilingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TilingMode::Grid => write!(f, "grid"),
            TilingMode::Snake => write!(f, "snake"),
        }
    }
}

/// Acquisition layout and channel naming of a CODEX experiment
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    pub name: Option<String>,
    pub region_names: Vec<String>,
    /// Tiles per row
    pub region_width: usize,
    /// Tiles per column
    pub region_height: usize,
    pub tiling_mode: TilingMode,
    pub n_z_planes: usize,
    /// Raw tile width in pixels, overlap included
    pub tile_width: usize,
    /// Raw tile height in pixels, overlap included
    pub tile_height: usize,
    pub tile_overlap_x: usize,
    pub tile_overlap_y: usize,
    pub n_channels_per_cycle: usize,
    /// Channel names, cycle-major
    pub channel_names: Vec<String>,
    /// Raw plane file name template
    pub raw_path_template: String,
}

impl ExperimentConfig {
    /// Load the configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to `experiment.toml`
    ///
    /// # Returns
    /// The parsed configuration or a `ConfigError` naming the problem
    pub fn load(path: &Path) -> CodexResult<Self> {
        info!("Loading experiment configuration from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            CodexError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse the configuration from TOML text
    pub fn from_toml_str(content: &str) -> CodexResult<Self> {
        let toml_value: toml::Value = content.parse()
            .map_err(|e| CodexError::ConfigError(format!("Invalid TOML: {}", e)))?;

        let experiment = section(&toml_value, "experiment")?;
        let channels = section(&toml_value, "channels")?;

        let region_names = match experiment.get("region_names") {
            Some(value) => string_list(value, "experiment.region_names")?,
            None => {
                let n_regions = required_usize(experiment, "experiment", "n_regions")?;
                (1..=n_regions).map(|r| format!("Region {}", r)).collect()
            }
        };

        let tiling_mode = match experiment.get("tiling_mode") {
            Some(value) => TilingMode::from_name(value.as_str().ok_or_else(|| {
                CodexError::ConfigError("experiment.tiling_mode must be a string".to_string())
            })?)?,
            None => TilingMode::Snake,
        };

        let raw_path_template = match toml_value.get("paths").and_then(|paths| paths.get("raw")) {
            Some(value) => value.as_str()
                .ok_or_else(|| CodexError::ConfigError("paths.raw must be a string".to_string()))?
                .to_string(),
            None => DEFAULT_RAW_TEMPLATE.to_string(),
        };

        let config = ExperimentConfig {
            name: experiment.get("name").and_then(|v| v.as_str()).map(str::to_string),
            region_names,
            region_width: required_usize(experiment, "experiment", "region_width")?,
            region_height: required_usize(experiment, "experiment", "region_height")?,
            tiling_mode,
            n_z_planes: required_usize(experiment, "experiment", "n_z_planes")?,
            tile_width: required_usize(experiment, "experiment", "tile_width")?,
            tile_height: required_usize(experiment, "experiment", "tile_height")?,
            tile_overlap_x: optional_usize(experiment, "experiment", "tile_overlap_x")?.unwrap_or(0),
            tile_overlap_y: optional_usize(experiment, "experiment", "tile_overlap_y")?.unwrap_or(0),
            n_channels_per_cycle: required_usize(channels, "channels", "n_channels_per_cycle")?,
            channel_names: string_list(
                channels.get("names").ok_or_else(|| missing("channels", "names"))?,
                "channels.names"
            )?,
            raw_path_template,
        };

        config.validate()?;
        debug!("Loaded experiment configuration: {:?}", config);
        Ok(config)
    }

    fn validate(&self) -> CodexResult<()> {
        if self.region_names.is_empty() {
            return Err(CodexError::ConfigError("experiment must define at least one region".to_string()));
        }
        if self.region_width == 0 || self.region_height == 0 {
            return Err(CodexError::ConfigError("experiment.region_width and region_height must be positive".to_string()));
        }
        if self.n_channels_per_cycle == 0 {
            return Err(CodexError::ConfigError("channels.n_channels_per_cycle must be positive".to_string()));
        }
        if self.channel_names.is_empty() || self.channel_names.len() % self.n_channels_per_cycle != 0 {
            return Err(CodexError::ConfigError(format!(
                "channels.names holds {} names, not a multiple of n_channels_per_cycle = {}",
                self.channel_names.len(), self.n_channels_per_cycle
            )));
        }
        if self.tile_overlap_x >= self.tile_width || self.tile_overlap_y >= self.tile_height {
            return Err(CodexError::ConfigError(format!(
                "tile overlap ({}, {}) must be smaller than the tile size ({}, {})",
                self.tile_overlap_x, self.tile_overlap_y, self.tile_width, self.tile_height
            )));
        }
        Ok(())
    }

    pub fn n_regions(&self) -> usize {
        self.region_names.len()
    }

    pub fn n_cycles(&self) -> usize {
        self.channel_names.len() / self.n_channels_per_cycle
    }

    pub fn n_tiles_per_region(&self) -> usize {
        self.region_width * self.region_height
    }

    /// Every tile location of the experiment, regions in order and tiles
    /// in acquisition order within each region
    pub fn tile_locations(&self) -> Vec<TileLocation> {
        let mut locations = Vec::with_capacity(self.n_regions() * self.n_tiles_per_region());
        for region_index in 0..self.n_regions() {
            for tile_index in 0..self.n_tiles_per_region() {
                let (tile_x, tile_y) = self.tiling_mode.coordinates(tile_index, self.region_width);
                locations.push(TileLocation { region_index, tile_index, tile_x, tile_y });
            }
        }
        locations
    }
}

impl ChannelLookup for ExperimentConfig {
    fn channel_coordinates(&self, name: &str) -> Option<(usize, usize)> {
        self.channel_names
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(|i| (i / self.n_channels_per_cycle, i % self.n_channels_per_cycle))
    }

    fn channel_names(&self) -> Vec<String> {
        self.channel_names.clone()
    }
}

fn missing(section: &str, key: &str) -> CodexError {
    CodexError::ConfigError(format!("missing required key {}.{}", section, key))
}

fn section<'v>(toml_value: &'v toml::Value, name: &str) -> CodexResult<&'v toml::Value> {
    match toml_value.get(name) {
        Some(value) if value.is_table() => Ok(value),
        Some(_) => Err(CodexError::ConfigError(format!("[{}] must be a table", name))),
        None => Err(CodexError::ConfigError(format!("missing required section [{}]", name))),
    }
}

fn optional_usize(table: &toml::Value, section: &str, key: &str) -> CodexResult<Option<usize>> {
    match table.get(key) {
        None => Ok(None),
        Some(value) => value.as_integer()
            .filter(|v| *v >= 0)
            .map(|v| Some(v as usize))
            .ok_or_else(|| CodexError::ConfigError(format!(
                "{}.{} must be a non-negative integer (given = {})", section, key, value
            ))),
    }
}

fn required_usize(table: &toml::Value, section: &str, key: &str) -> CodexResult<usize> {
    optional_usize(table, section, key)?.ok_or_else(|| missing(section, key))
}

fn string_list(value: &toml::Value, key: &str) -> CodexResult<Vec<String>> {
    let array = value.as_array()
        .ok_or_else(|| CodexError::ConfigError(format!("{} must be an array of strings", key)))?;

    array.iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(|| {
            CodexError::ConfigError(format!("{} must only hold strings (found {})", key, item))
        }))
        .collect()
}

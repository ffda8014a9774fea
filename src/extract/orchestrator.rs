//! Extraction orchestration
//!
//! For every selected tile location, generates one tile per channel source,
//! crops raw tiles, slices out the requested (cycle, z, channel) sub-volumes
//! and writes them as one (1, z, channels, height, width) stack.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use ndarray::{s, stack, Array3, Axis};

use crate::errors::{CodexError, CodexResult};
use crate::extract::channels::{group_by_source, map_channels, ChannelDescriptor, ChannelLookup, ChannelSource};
use crate::extract::indexes::resolve_index_list;
use crate::extract::locations::{get_tile_locations, TileLocation};
use crate::extract::zslice::{get_z_slice_fn, FocusMapSource, ZSlice};
use crate::extract::TileStack;
use crate::utils::progress::ProgressTracker;

/// How the generator should assemble a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorMode {
    /// From the per-plane raw acquisition images
    Raw,
    /// From the stored stack of a derived source
    Stack(ChannelSource),
}

impl GeneratorMode {
    pub fn for_source(source: ChannelSource) -> Self {
        match source {
            ChannelSource::Raw => GeneratorMode::Raw,
            other => GeneratorMode::Stack(other),
        }
    }
}

/// Produces the full (cycle, z, channel, height, width) stack of a tile
pub trait TileGenerator {
    fn generate_tile(&self, location: &TileLocation, mode: GeneratorMode) -> CodexResult<TileStack>;
}

/// Removes acquisition overlap from a raw tile
pub trait TileCropper {
    fn crop_tile(&self, tile: TileStack) -> CodexResult<TileStack>;
}

/// Persists an extracted tile
pub trait TileWriter {
    fn write_tile(&self, path: &Path, tile: &TileStack) -> CodexResult<()>;
}

/// What the experiment offers to an extraction
pub struct ExperimentView<'a> {
    /// Channel lookup for raw and processed channels
    pub channels: &'a dyn ChannelLookup,
    /// Channel lookup for cytometric channels
    pub cytometry: &'a dyn ChannelLookup,
    pub focus: &'a dyn FocusMapSource,
    /// Every configured tile location, in enumeration order
    pub locations: Vec<TileLocation>,
}

/// Tile input and output used by an extraction
pub struct TileIo<'a> {
    pub generator: &'a dyn TileGenerator,
    pub cropper: &'a dyn TileCropper,
    pub writer: &'a dyn TileWriter,
}

/// Parameters of one extraction
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    /// Name of the extraction, used as the output directory name
    pub name: String,
    /// Prefixed channel names
    pub channels: Vec<String>,
    /// `best`, `all` or a 1-based z index expression
    pub z: String,
    /// Optional 1-based region index expression
    pub region_indexes: Option<String>,
    /// Optional 1-based tile index expression
    pub tile_indexes: Option<String>,
}

/// Outcome of a finished extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub output_dir: PathBuf,
    pub tiles_written: usize,
}

/// Runs extractions against one experiment
pub struct Extractor<'a> {
    data_dir: PathBuf,
    experiment: ExperimentView<'a>,
    io: TileIo<'a>,
    show_progress: bool,
}

impl<'a> Extractor<'a> {
    pub fn new(data_dir: &Path, experiment: ExperimentView<'a>, io: TileIo<'a>) -> Self {
        Extractor {
            data_dir: data_dir.to_path_buf(),
            experiment,
            io,
            show_progress: false,
        }
    }

    /// Draw a progress bar over the tile locations
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Directory receiving the tiles of the named extraction
    pub fn output_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join("output").join("extract").join(name)
    }

    /// Run an extraction
    ///
    /// Channels, the z selector and both index expressions are validated
    /// before any tile is generated.
    ///
    /// # Arguments
    /// * `request` - Extraction name, channels, z selector and tile filters
    ///
    /// # Returns
    /// The output directory and the number of tiles written
    pub fn run(&self, request: &ExtractRequest) -> CodexResult<ExtractSummary> {
        if request.channels.is_empty() {
            return Err(CodexError::UnknownChannel(format!(
                "extraction \"{}\" requests no channels", request.name
            )));
        }

        let descriptors = map_channels(&request.channels, self.experiment.channels, self.experiment.cytometry)?;
        let groups = group_by_source(&descriptors);
        let z_slice_fn = get_z_slice_fn(&request.z, self.experiment.focus)?;
        let region_indexes = resolve_index_list(request.region_indexes.as_deref())?;
        let tile_indexes = resolve_index_list(request.tile_indexes.as_deref())?;
        info!("Creating extraction \"{}\" ...", request.name);

        let locations = get_tile_locations(
            self.experiment.locations.iter().copied(),
            region_indexes.as_deref(),
            tile_indexes.as_deref()
        );

        let output_dir = self.output_dir(&request.name);
        let progress = if self.show_progress {
            ProgressTracker::new(locations.len() as u64, &format!("Extracting {}", request.name))
        } else {
            ProgressTracker::hidden(locations.len() as u64)
        };

        for (i, location) in locations.iter().enumerate() {
            info!("Extracting tile {} of {}", i + 1, locations.len());

            let z_slice = z_slice_fn(location.region_index, location.tile_x, location.tile_y)?;
            let mut sub_tiles = Vec::with_capacity(descriptors.len());

            for (source, source_descriptors) in &groups {
                let mut tile = self.io.generator.generate_tile(location, GeneratorMode::for_source(*source))?;
                if *source == ChannelSource::Raw {
                    tile = self.io.cropper.crop_tile(tile)?;
                }

                for descriptor in source_descriptors {
                    let sub_tile = slice_sub_tile(&tile, descriptor, &z_slice)?;
                    debug!("Extracted {} channel {} (cycle {}, channel {}) from {} with shape {:?}",
                           descriptor.source, descriptor.channel_name, descriptor.cycle_index,
                           descriptor.channel_index, location, sub_tile.shape());
                    sub_tiles.push(sub_tile);
                }
            }

            let extracted = stack_sub_tiles(&sub_tiles, &descriptors_in_stack_order(&groups))?;
            self.io.writer.write_tile(&output_dir.join(location.file_name()), &extracted)?;
            progress.increment(1);
        }

        progress.finish();
        info!("Extraction complete (results saved to {})", output_dir.display());

        Ok(ExtractSummary {
            output_dir,
            tiles_written: locations.len(),
        })
    }
}

fn descriptors_in_stack_order(
    groups: &BTreeMap<ChannelSource, Vec<ChannelDescriptor>>
) -> Vec<&ChannelDescriptor> {
    groups.values().flatten().collect()
}

/// Take the (z, height, width) volume of one channel out of a tile
pub fn slice_sub_tile(tile: &TileStack, descriptor: &ChannelDescriptor, z_slice: &ZSlice) -> CodexResult<Array3<u16>> {
    let (n_cycles, n_planes, n_channels, _, _) = tile.dim();
    let out_of_range = |what: &str, index: usize, size: usize| {
        CodexError::IndexOutOfRange(format!(
            "{} index {} of {} channel \"{}\" is outside the tile ({} {}s)",
            what, index, descriptor.source, descriptor.channel_name, size, what
        ))
    };

    if descriptor.cycle_index >= n_cycles {
        return Err(out_of_range("cycle", descriptor.cycle_index, n_cycles));
    }
    if descriptor.channel_index >= n_channels {
        return Err(out_of_range("channel", descriptor.channel_index, n_channels));
    }

    let planes = z_slice.resolve(n_planes);
    if let Some(&z) = planes.iter().find(|&&z| z >= n_planes) {
        return Err(out_of_range("z", z, n_planes));
    }

    let volume = tile.slice(s![descriptor.cycle_index, .., descriptor.channel_index, .., ..]);
    Ok(volume.select(Axis(0), &planes))
}

/// Stack sub-tiles along a channel axis and add a leading cycle axis
pub fn stack_sub_tiles(sub_tiles: &[Array3<u16>], descriptors: &[&ChannelDescriptor]) -> CodexResult<TileStack> {
    let first = sub_tiles.first()
        .ok_or_else(|| CodexError::DimensionMismatch("no channels to stack".to_string()))?;

    for (sub_tile, descriptor) in sub_tiles.iter().zip(descriptors).skip(1) {
        if sub_tile.shape() != first.shape() {
            return Err(CodexError::DimensionMismatch(format!(
                "{} channel \"{}\" has (z, height, width) = {:?} but the first channel has {:?}",
                descriptor.source, descriptor.channel_name, sub_tile.shape(), first.shape()
            )));
        }
    }

    let views: Vec<_> = sub_tiles.iter().map(|t| t.view()).collect();
    let stacked = stack(Axis(1), &views)
        .map_err(|e| CodexError::DimensionMismatch(e.to_string()))?;
    Ok(stacked.insert_axis(Axis(0)))
}

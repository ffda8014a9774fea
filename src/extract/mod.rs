//! Channel and z-plane extraction
//!
//! Resolves requested channels, z planes and tile locations and runs the
//! per-tile extraction that turns source tiles into extracted stacks.

pub mod indexes;
pub mod channels;
pub mod zslice;
pub mod locations;
pub mod orchestrator;

use ndarray::Array5;

/// Pixels of a tile, shaped (cycle, z, channel, height, width)
pub type TileStack = Array5<u16>;

pub use channels::{ChannelDescriptor, ChannelLookup, ChannelSource};
pub use locations::TileLocation;
pub use orchestrator::{ExtractRequest, ExtractSummary, Extractor, ExperimentView, GeneratorMode, TileCropper, TileGenerator, TileIo, TileWriter};
pub use zslice::{FocusMapSource, ZSlice};

pub mod io;
pub mod tiff;
pub mod utils;
pub mod compression;
pub mod errors;
pub mod config;
pub mod extract;
pub mod codex;
pub mod commands;
pub mod api;

pub use crate::api::CodexKit;
pub use crate::errors::{CodexError, CodexResult};

pub use config::ExperimentConfig;
pub use extract::{ChannelDescriptor, ChannelSource, ExtractRequest, ExtractSummary, TileLocation, ZSlice};
pub use tiff::{read_hyperstack, write_hyperstack, TiffReader};

//! Persistence of extracted tiles

use std::path::Path;

use log::debug;

use crate::compression::CompressionHandler;
use crate::errors::CodexResult;
use crate::extract::orchestrator::TileWriter;
use crate::extract::TileStack;
use crate::tiff::hyperstack::write_hyperstack;
use crate::utils::logger::Logger;

/// Writes extracted tiles as ImageJ hyperstack TIFFs
pub struct HyperstackTileWriter<'a> {
    compression: Box<dyn CompressionHandler>,
    logger: &'a Logger,
}

impl<'a> HyperstackTileWriter<'a> {
    pub fn new(compression: Box<dyn CompressionHandler>, logger: &'a Logger) -> Self {
        HyperstackTileWriter { compression, logger }
    }
}

impl TileWriter for HyperstackTileWriter<'_> {
    fn write_tile(&self, path: &Path, tile: &TileStack) -> CodexResult<()> {
        debug!("Writing {:?} tile with {} compression to {}", tile.shape(), self.compression.name(), path.display());
        write_hyperstack(path, tile, self.compression.as_ref(), self.logger)?;
        Ok(())
    }
}

//! Overlap removal for raw tiles
//!
//! Neighbouring raw tiles share `tile_overlap_x` columns and
//! `tile_overlap_y` rows. Half of each overlap is trimmed from both sides.

use log::debug;
use ndarray::s;

use crate::config::ExperimentConfig;
use crate::errors::{CodexError, CodexResult};
use crate::extract::orchestrator::TileCropper;
use crate::extract::TileStack;

/// Crops raw tiles down to their non-overlapping core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapCrop {
    pub tile_width: usize,
    pub tile_height: usize,
    pub overlap_x: usize,
    pub overlap_y: usize,
}

impl OverlapCrop {
    pub fn from_config(config: &ExperimentConfig) -> Self {
        OverlapCrop {
            tile_width: config.tile_width,
            tile_height: config.tile_height,
            overlap_x: config.tile_overlap_x,
            overlap_y: config.tile_overlap_y,
        }
    }

    /// Kept rows and columns as half-open ranges
    pub fn window(&self) -> ((usize, usize), (usize, usize)) {
        let row_start = self.overlap_y / 2;
        let col_start = self.overlap_x / 2;
        (
            (row_start, row_start + self.tile_height - self.overlap_y),
            (col_start, col_start + self.tile_width - self.overlap_x),
        )
    }
}

impl TileCropper for OverlapCrop {
    fn crop_tile(&self, tile: TileStack) -> CodexResult<TileStack> {
        if self.overlap_x == 0 && self.overlap_y == 0 {
            return Ok(tile);
        }

        let (_, _, _, height, width) = tile.dim();
        if height < self.tile_height || width < self.tile_width {
            return Err(CodexError::DimensionMismatch(format!(
                "raw tile is {}x{} pixels, smaller than the configured {}x{}",
                width, height, self.tile_width, self.tile_height
            )));
        }

        let ((row_start, row_end), (col_start, col_end)) = self.window();
        debug!("Cropping raw tile to rows {}..{} and columns {}..{}", row_start, row_end, col_start, col_end);
        Ok(tile.slice(s![.., .., .., row_start..row_end, col_start..col_end]).to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array5;

    fn crop(overlap_x: usize, overlap_y: usize) -> OverlapCrop {
        OverlapCrop { tile_width: 10, tile_height: 8, overlap_x, overlap_y }
    }

    #[test]
    fn test_crop_removes_half_overlap_each_side() {
        let tile = Array5::from_shape_fn((1, 2, 1, 8, 10), |(_, _, _, y, x)| (y * 100 + x) as u16);
        let cropped = crop(4, 2).crop_tile(tile).unwrap();

        assert_eq!(cropped.shape(), &[1, 2, 1, 6, 6]);
        assert_eq!(cropped[[0, 0, 0, 0, 0]], 102);
        assert_eq!(cropped[[0, 1, 0, 5, 5]], 607);
    }

    #[test]
    fn test_odd_overlap() {
        assert_eq!(crop(3, 1).window(), ((0, 7), (1, 8)));
    }

    #[test]
    fn test_zero_overlap_is_noop() {
        let tile = Array5::<u16>::ones((1, 1, 1, 3, 3));
        assert_eq!(crop(0, 0).crop_tile(tile.clone()).unwrap(), tile);
    }

    #[test]
    fn test_small_tile_rejected() {
        let tile = Array5::<u16>::zeros((1, 1, 1, 4, 10));
        assert!(matches!(crop(4, 2).crop_tile(tile), Err(CodexError::DimensionMismatch(_))));
    }
}

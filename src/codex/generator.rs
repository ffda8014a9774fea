//! File-system tile generation
//!
//! Raw tiles are assembled from one image file per (cycle, z, channel)
//! plane. Processed and cytometric tiles are read from hyperstack TIFFs.

use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use image::DynamicImage;
use ndarray::{s, Array2, Array5};

use crate::codex::paths::{self, TemplateValues};
use crate::config::ExperimentConfig;
use crate::errors::{CodexError, CodexResult};
use crate::extract::locations::TileLocation;
use crate::extract::orchestrator::{GeneratorMode, TileGenerator};
use crate::extract::TileStack;
use crate::tiff::hyperstack::read_hyperstack;

/// Generates tiles from the files of an experiment's data directory
pub struct FsTileGenerator<'a> {
    data_dir: PathBuf,
    config: &'a ExperimentConfig,
}

impl<'a> FsTileGenerator<'a> {
    pub fn new(data_dir: &Path, config: &'a ExperimentConfig) -> Self {
        FsTileGenerator {
            data_dir: data_dir.to_path_buf(),
            config,
        }
    }

    /// Path of one raw plane
    pub fn raw_plane_path(&self, location: &TileLocation, cycle: usize, z: usize, channel: usize) -> CodexResult<PathBuf> {
        let values = TemplateValues::for_tile(location).with_plane(cycle, z, channel);
        Ok(self.data_dir.join(paths::render(&self.config.raw_path_template, &values)?))
    }

    /// Assemble a raw tile from its plane images
    fn generate_raw(&self, location: &TileLocation) -> CodexResult<TileStack> {
        let n_cycles = self.config.n_cycles();
        let n_planes = self.config.n_z_planes;
        let n_channels = self.config.n_channels_per_cycle;
        info!("Reading {} raw planes for {}", n_cycles * n_planes * n_channels, location);

        let mut tile: Option<Array5<u16>> = None;

        for cycle in 0..n_cycles {
            for z in 0..n_planes {
                for channel in 0..n_channels {
                    let path = self.raw_plane_path(location, cycle, z, channel)?;
                    let plane = read_raw_plane(&path)?;
                    let (height, width) = plane.dim();

                    let tile = tile.get_or_insert_with(|| {
                        Array5::zeros((n_cycles, n_planes, n_channels, height, width))
                    });

                    let (_, _, _, tile_height, tile_width) = tile.dim();
                    if (height, width) != (tile_height, tile_width) {
                        return Err(CodexError::DimensionMismatch(format!(
                            "raw plane {} is {}x{}, other planes of the tile are {}x{}",
                            path.display(), width, height, tile_width, tile_height
                        )));
                    }

                    tile.slice_mut(s![cycle, z, channel, .., ..]).assign(&plane);
                }
            }
        }

        tile.ok_or_else(|| CodexError::ConfigError("experiment defines no raw planes".to_string()))
    }

    /// Read the stored hyperstack of a processed or cytometric tile
    fn generate_stack(&self, location: &TileLocation, template: &str) -> CodexResult<TileStack> {
        let path = self.data_dir.join(paths::render(template, &TemplateValues::for_tile(location))?);
        if !path.is_file() {
            return Err(CodexError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                format!("tile stack {} not found", path.display())
            )));
        }

        let tile = read_hyperstack(&path)?;
        debug!("Read tile stack {} with shape {:?}", path.display(), tile.shape());
        Ok(tile)
    }
}

impl TileGenerator for FsTileGenerator<'_> {
    fn generate_tile(&self, location: &TileLocation, mode: GeneratorMode) -> CodexResult<TileStack> {
        match mode {
            GeneratorMode::Raw => self.generate_raw(location),
            GeneratorMode::Stack(source) => self.generate_stack(location, paths::stack_template(source)?),
        }
    }
}

/// Decode one grayscale raw plane as 16-bit samples
///
/// 8-bit samples are widened, not rescaled, so intensities stay native.
/// Color and floating point planes are rejected.
pub fn read_raw_plane(path: &Path) -> CodexResult<Array2<u16>> {
    let image = image::open(path)
        .map_err(|e| CodexError::ImageError(format!("{}: {}", path.display(), e)))?;

    let ((width, height), samples): ((u32, u32), Vec<u16>) = match image {
        DynamicImage::ImageLuma8(gray) => (gray.dimensions(), gray.into_raw().into_iter().map(u16::from).collect()),
        DynamicImage::ImageLuma16(gray) => (gray.dimensions(), gray.into_raw()),
        other => {
            return Err(CodexError::ImageError(format!(
                "{}: raw planes must be 8 or 16-bit grayscale, found {:?}",
                path.display(), other.color()
            )));
        }
    };

    Array2::from_shape_vec((height as usize, width as usize), samples)
        .map_err(|e| CodexError::DimensionMismatch(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codex::HyperstackTileWriter;
    use crate::compression::CompressionFactory;
    use crate::extract::channels::ChannelSource;
    use crate::extract::orchestrator::TileWriter;
    use crate::utils::logger::Logger;
    use image::{ImageBuffer, Luma, Rgb};
    use std::fs;

    const EXPERIMENT: &str = r#"
[experiment]
n_regions = 1
region_width = 2
region_height = 1
tiling_mode = "grid"
n_z_planes = 2
tile_width = 4
tile_height = 3

[channels]
n_channels_per_cycle = 2
names = ["DAPI", "CD4", "DAPI2", "CD8"]

[paths]
raw = "raw/c{cycle}_t{tile}_z{z}_ch{channel}.png"
"#;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("codexkit-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn location() -> TileLocation {
        TileLocation { region_index: 0, tile_index: 1, tile_x: 1, tile_y: 0 }
    }

    #[test]
    fn test_raw_tile_from_planes() {
        let dir = scratch_dir("raw-planes");
        let config = ExperimentConfig::from_toml_str(EXPERIMENT).unwrap();
        let generator = FsTileGenerator::new(&dir, &config);

        for cycle in 0..2 {
            for z in 0..2 {
                for channel in 0..2 {
                    let value = (cycle * 100 + z * 10 + channel) as u16 * 100;
                    let plane: ImageBuffer<Luma<u16>, Vec<u16>> =
                        ImageBuffer::from_fn(4, 3, |x, y| Luma([value + (y * 4 + x) as u16]));
                    let path = generator.raw_plane_path(&location(), cycle, z, channel).unwrap();
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    plane.save(&path).unwrap();
                }
            }
        }

        let tile = generator.generate_tile(&location(), GeneratorMode::Raw).unwrap();
        assert_eq!(tile.shape(), &[2, 2, 2, 3, 4]);
        assert_eq!(tile[[1, 0, 1, 0, 0]], 10100);
        assert_eq!(tile[[0, 1, 0, 2, 3]], 1000 + 11);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_raw_plane_keeps_native_intensities() {
        let dir = scratch_dir("raw-depth");

        let narrow: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_fn(2, 2, |x, y| Luma([10 + (y * 2 + x) as u8]));
        narrow.save(dir.join("narrow.png")).unwrap();
        let plane = read_raw_plane(&dir.join("narrow.png")).unwrap();
        assert_eq!(plane, Array2::from_shape_vec((2, 2), vec![10, 11, 12, 13]).unwrap());

        let wide: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_pixel(3, 1, Luma([4000]));
        wide.save(dir.join("wide.png")).unwrap();
        assert_eq!(read_raw_plane(&dir.join("wide.png")).unwrap(), Array2::from_elem((1, 3), 4000));

        let color: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(2, 2, Rgb([10, 20, 30]));
        color.save(dir.join("color.png")).unwrap();
        assert!(matches!(read_raw_plane(&dir.join("color.png")), Err(CodexError::ImageError(_))));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_raw_plane() {
        let dir = scratch_dir("raw-missing");
        let config = ExperimentConfig::from_toml_str(EXPERIMENT).unwrap();
        let generator = FsTileGenerator::new(&dir, &config);
        assert!(matches!(
            generator.generate_tile(&location(), GeneratorMode::Raw),
            Err(CodexError::ImageError(_))
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_stack_tile_from_hyperstack() {
        let dir = scratch_dir("stack");
        let config = ExperimentConfig::from_toml_str(EXPERIMENT).unwrap();
        let generator = FsTileGenerator::new(&dir, &config);

        let stack = Array5::from_shape_fn((1, 2, 4, 3, 4), |(_, z, c, y, x)| (z * 1000 + c * 100 + y * 4 + x) as u16);
        let logger = Logger::null();
        let writer = HyperstackTileWriter::new(CompressionFactory::get_handler_by_name("deflate").unwrap(), &logger);
        writer.write_tile(&dir.join("cytometry/tile/R001_X002_Y001.tif"), &stack).unwrap();

        let tile = generator.generate_tile(&location(), GeneratorMode::Stack(ChannelSource::Cyto)).unwrap();
        assert_eq!(tile, stack);

        assert!(matches!(
            generator.generate_tile(&location(), GeneratorMode::Stack(ChannelSource::Proc)),
            Err(CodexError::IoError(_))
        ));
        let _ = fs::remove_dir_all(&dir);
    }
}

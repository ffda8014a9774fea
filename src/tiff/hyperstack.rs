//! ImageJ hyperstack reading and writing
//!
//! A hyperstack is a multi-page TIFF whose pages hold the planes of a
//! (frames, slices, channels, height, width) array in C order, channel
//! fastest. The shape travels in the first page's ImageDescription using
//! ImageJ's `key=value` lines. CODEX tiles map cycles to frames and z planes
//! to slices.

use std::path::Path;

use log::{debug, info, warn};
use ndarray::{s, Array5};

use crate::compression::CompressionHandler;
use crate::tiff::builder::TiffBuilder;
use crate::tiff::builders::writer::WriterBuilder;
use crate::tiff::constants::tags;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::pages::PageReader;
use crate::tiff::reader::TiffReader;
use crate::utils::logger::Logger;

/// Entries written per page by `write_hyperstack`
const ENTRIES_PER_PAGE: usize = 13;

/// Shape of a hyperstack, excluding the plane dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HyperstackShape {
    /// Number of time points (cycles)
    pub frames: usize,
    /// Number of z planes
    pub slices: usize,
    /// Number of channels
    pub channels: usize,
}

impl HyperstackShape {
    pub fn new(frames: usize, slices: usize, channels: usize) -> Self {
        HyperstackShape { frames, slices, channels }
    }

    /// Total number of planes
    pub fn images(&self) -> usize {
        self.frames * self.slices * self.channels
    }

    /// ImageJ description text for this shape
    pub fn description(&self) -> String {
        format!(
            "ImageJ=1.11a\nimages={}\nchannels={}\nslices={}\nframes={}\nhyperstack=true\nmode=grayscale\nloop=false\n",
            self.images(), self.channels, self.slices, self.frames
        )
    }

    /// Parse the shape from an ImageJ description
    ///
    /// Missing `channels`, `slices` or `frames` default to 1. Returns None
    /// when the text is not an ImageJ description.
    pub fn parse(description: &str) -> Option<Self> {
        if !description.starts_with("ImageJ=") {
            return None;
        }

        let mut shape = HyperstackShape::new(1, 1, 1);
        for line in description.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let parsed = value.trim().parse::<usize>().ok();
            match (key.trim(), parsed) {
                ("channels", Some(v)) => shape.channels = v,
                ("slices", Some(v)) => shape.slices = v,
                ("frames", Some(v)) => shape.frames = v,
                _ => {}
            }
        }

        Some(shape)
    }
}

/// Read a hyperstack TIFF into a (frames, slices, channels, height, width) array
///
/// Files without ImageJ metadata are read as a z stack of a single channel.
pub fn read_hyperstack(path: &Path) -> TiffResult<Array5<u16>> {
    let path_str = path.to_str()
        .ok_or_else(|| TiffError::GenericError(format!("Non UTF-8 path: {}", path.display())))?;

    let mut tiff_reader = TiffReader::new();
    let tiff = tiff_reader.load(path_str)?;
    let first = tiff.main_ifd()
        .ok_or_else(|| TiffError::GenericError(format!("No pages in {}", path.display())))?;

    let mut page_reader = PageReader::new(tiff_reader.create_reader()?, &tiff_reader);
    let mut description_reader = tiff_reader.create_reader()?;
    let description = tiff_reader.read_ascii_tag(&mut description_reader, first, tags::IMAGE_DESCRIPTION)?;

    let shape = match description.as_deref().and_then(HyperstackShape::parse) {
        Some(shape) => shape,
        None => {
            warn!("No ImageJ metadata in {}, reading {} pages as z planes", path.display(), tiff.ifd_count());
            HyperstackShape::new(1, tiff.ifd_count(), 1)
        }
    };

    if shape.images() != tiff.ifd_count() {
        return Err(TiffError::GenericError(format!(
            "{} declares {} images ({:?}) but holds {} pages",
            path.display(), shape.images(), shape, tiff.ifd_count()
        )));
    }

    let first_layout = page_reader.layout(first)?;
    let (height, width) = (first_layout.height, first_layout.width);
    let mut data = Vec::with_capacity(shape.images() * height * width);

    for ifd in &tiff.ifds {
        check_page_size(ifd, width, height)?;
        data.extend(page_reader.read_plane(ifd)?);
    }

    debug!("Read hyperstack {} with shape {:?} and planes {}x{}", path.display(), shape, height, width);

    Array5::from_shape_vec((shape.frames, shape.slices, shape.channels, height, width), data)
        .map_err(|e| TiffError::GenericError(format!("Cannot shape hyperstack {}: {}", path.display(), e)))
}

fn check_page_size(ifd: &IFD, width: usize, height: usize) -> TiffResult<()> {
    match ifd.get_dimensions() {
        Some((w, h)) if w as usize == width && h as usize == height => Ok(()),
        Some((w, h)) => Err(TiffError::GenericError(format!(
            "page {} is {}x{}, expected {}x{}", ifd.number, w, h, width, height
        ))),
        None => Err(TiffError::MissingDimensions),
    }
}

/// Write a (frames, slices, channels, height, width) array as a 16-bit hyperstack
pub fn write_hyperstack(
    path: &Path,
    stack: &Array5<u16>,
    handler: &dyn CompressionHandler,
    logger: &Logger
) -> TiffResult<()> {
    let builder = build_hyperstack(stack, handler, logger)?;
    builder.write(path)?;
    info!("Saved hyperstack {:?} to {}", stack.shape(), path.display());
    Ok(())
}

/// Assemble the pages of a hyperstack without writing them
pub fn build_hyperstack<'a>(
    stack: &Array5<u16>,
    handler: &dyn CompressionHandler,
    logger: &'a Logger
) -> TiffResult<TiffBuilder<'a>> {
    let (frames, slices, channels, height, width) = stack.dim();
    if stack.is_empty() {
        return Err(TiffError::GenericError(format!("Cannot write empty hyperstack {:?}", stack.shape())));
    }

    let shape = HyperstackShape::new(frames, slices, channels);
    let raw_bytes = (stack.len() * 2) as u64;
    let estimated = WriterBuilder::estimate_size(shape.images(), ENTRIES_PER_PAGE, raw_bytes, 4096, false);
    // Leave headroom for strips that grow under compression
    let is_big_tiff = estimated + raw_bytes / 64 >= u32::MAX as u64;

    let mut builder = TiffBuilder::new(logger, is_big_tiff);

    for t in 0..frames {
        for z in 0..slices {
            for c in 0..channels {
                let plane = stack.slice(s![t, z, c, .., ..]);
                let mut bytes = Vec::with_capacity(height * width * 2);
                for value in plane.iter() {
                    bytes.extend_from_slice(&value.to_le_bytes());
                }

                let strip = handler.compress(&bytes)?;
                let ifd_index = builder.add_ifd(IFD::new(builder.ifds.len(), 0));
                builder.add_basic_gray_tags(ifd_index, width as u32, height as u32, 16, handler.code());
                builder.setup_single_strip(ifd_index, strip);

                if ifd_index == 0 {
                    builder.add_ascii_tag(ifd_index, tags::IMAGE_DESCRIPTION, &shape.description());
                    builder.add_ascii_tag(ifd_index, tags::SOFTWARE, "codexkit");
                }
            }
        }
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::CompressionFactory;
    use std::io::Cursor;

    fn sample_stack() -> Array5<u16> {
        Array5::from_shape_fn((2, 3, 2, 4, 5), |(t, z, c, y, x)| {
            (t * 10000 + z * 1000 + c * 100 + y * 10 + x) as u16
        })
    }

    #[test]
    fn test_description_parse() {
        let shape = HyperstackShape::new(3, 7, 4);
        assert_eq!(HyperstackShape::parse(&shape.description()), Some(shape));
        assert_eq!(HyperstackShape::parse("ImageJ=1.52\nslices=5\n"), Some(HyperstackShape::new(1, 5, 1)));
        assert_eq!(HyperstackShape::parse("made by a camera"), None);
    }

    #[test]
    fn test_written_pages_read_back_in_order() {
        let logger = Logger::null();
        let stack = sample_stack();

        for name in ["none", "zstd"] {
            let handler = CompressionFactory::get_handler_by_name(name).unwrap();
            let builder = build_hyperstack(&stack, handler.as_ref(), &logger).unwrap();
            let mut cursor = Cursor::new(Vec::new());
            builder.write_to(&mut cursor).unwrap();
            cursor.set_position(0);

            let mut tiff_reader = TiffReader::new();
            let tiff = tiff_reader.read(&mut cursor).unwrap();
            assert_eq!(tiff.ifd_count(), 12);

            let description = tiff_reader
                .read_ascii_tag(&mut cursor, &tiff.ifds[0], tags::IMAGE_DESCRIPTION)
                .unwrap()
                .unwrap();
            assert_eq!(HyperstackShape::parse(&description), Some(HyperstackShape::new(2, 3, 2)));

            let bytes = cursor.into_inner();
            let mut page_reader = PageReader::new(Cursor::new(bytes), &tiff_reader);
            // Page 7 is t=1, z=0, c=1
            let plane = page_reader.read_plane(&tiff.ifds[7]).unwrap();
            assert_eq!(plane.len(), 20);
            assert_eq!(plane[0], 10100);
            assert_eq!(plane[19], 10134);
        }
    }

    #[test]
    fn test_empty_stack_rejected() {
        let logger = Logger::null();
        let stack = Array5::<u16>::zeros((1, 0, 1, 4, 4));
        let handler = CompressionFactory::get_handler_by_name("none").unwrap();
        assert!(build_hyperstack(&stack, handler.as_ref(), &logger).is_err());
    }
}

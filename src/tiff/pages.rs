//! Strip-based page data extraction
//!
//! Reads the pixel plane of one grayscale page from a stripped TIFF,
//! decompressing each strip and undoing horizontal differencing when the
//! page uses it. Samples are widened to 16 bits.

use log::{debug, trace};
use std::io::SeekFrom;

use crate::compression::{CompressionFactory, CompressionHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{compression, predictor, sample_format, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

/// Reads page planes from stripped, single-sample TIFF pages
pub struct PageReader<'a, R: SeekableReader> {
    /// Reader for accessing the TIFF file
    reader: R,
    /// TIFF reader holding the file's byte order
    tiff_reader: &'a TiffReader,
}

/// Pixel layout of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub width: usize,
    pub height: usize,
    pub bits_per_sample: u16,
}

impl<'a, R: SeekableReader> PageReader<'a, R> {
    /// Create a new page reader over an open file
    pub fn new(reader: R, tiff_reader: &'a TiffReader) -> Self {
        PageReader { reader, tiff_reader }
    }

    /// Validate that a page holds a single 8- or 16-bit unsigned sample per pixel
    pub fn layout(&mut self, ifd: &IFD) -> TiffResult<PageLayout> {
        let (width, height) = ifd.get_dimensions().ok_or(TiffError::MissingDimensions)?;

        if ifd.get_samples_per_pixel() != 1 {
            return Err(TiffError::UnsupportedPixelFormat(format!(
                "page {} has {} samples per pixel, expected 1",
                ifd.number, ifd.get_samples_per_pixel()
            )));
        }

        if let Some(format) = ifd.get_tag_value(tags::SAMPLE_FORMAT) {
            if format as u16 != sample_format::UNSIGNED {
                return Err(TiffError::UnsupportedPixelFormat(format!(
                    "page {} has sample format {}, expected unsigned integers",
                    ifd.number, format
                )));
            }
        }

        let bits_per_sample = match ifd.get_entry(tags::BITS_PER_SAMPLE) {
            Some(_) => self.tiff_reader.read_tag_values(&mut self.reader, ifd, tags::BITS_PER_SAMPLE)?
                .first()
                .copied()
                .unwrap_or(1) as u16,
            None => 1,
        };

        if bits_per_sample != 8 && bits_per_sample != 16 {
            return Err(TiffError::UnsupportedPixelFormat(format!(
                "page {} has {} bits per sample, expected 8 or 16",
                ifd.number, bits_per_sample
            )));
        }

        Ok(PageLayout {
            width: width as usize,
            height: height as usize,
            bits_per_sample,
        })
    }

    /// Read the full plane of a page in row-major order
    pub fn read_plane(&mut self, ifd: &IFD) -> TiffResult<Vec<u16>> {
        let layout = self.layout(ifd)?;

        if ifd.has_tag(tags::TILE_OFFSETS) {
            return Err(TiffError::UnsupportedPixelFormat(format!(
                "page {} is tiled; only stripped pages are supported", ifd.number
            )));
        }

        let compression_code = ifd.get_tag_value(tags::COMPRESSION).unwrap_or(compression::NONE as u64);
        let handler = CompressionFactory::create_handler(compression_code)?;
        let predictor_code = ifd.get_tag_value(tags::PREDICTOR).unwrap_or(predictor::NONE as u64) as u16;
        let rows_per_strip = ifd.get_tag_value(tags::ROWS_PER_STRIP)
            .map(|rows| rows as usize)
            .unwrap_or(layout.height)
            .max(1);

        let strip_offsets = self.tiff_reader.read_tag_values(&mut self.reader, ifd, tags::STRIP_OFFSETS)?;
        let strip_byte_counts = self.tiff_reader.read_tag_values(&mut self.reader, ifd, tags::STRIP_BYTE_COUNTS)?;

        if strip_offsets.len() != strip_byte_counts.len() {
            return Err(TiffError::GenericError(format!(
                "page {} has {} strip offsets but {} byte counts",
                ifd.number, strip_offsets.len(), strip_byte_counts.len()
            )));
        }

        debug!("Reading page {} ({}x{}, {} bits, {}, {} strips)",
               ifd.number, layout.width, layout.height, layout.bits_per_sample,
               handler.name(), strip_offsets.len());

        let byte_order = self.tiff_reader.byte_order()?;
        let mut plane = Vec::with_capacity(layout.width * layout.height);

        for (strip_idx, (&offset, &byte_count)) in strip_offsets.iter().zip(&strip_byte_counts).enumerate() {
            let rows = rows_per_strip.min(layout.height.saturating_sub(strip_idx * rows_per_strip));
            if rows == 0 {
                break;
            }

            let bytes = self.read_strip(offset, byte_count, handler.as_ref())?;
            let mut samples: Vec<u16> = match layout.bits_per_sample {
                8 => bytes.into_iter().map(u16::from).collect(),
                _ => byte_order.decode_u16_samples(&bytes),
            };

            let expected = rows * layout.width;
            if samples.len() < expected {
                return Err(TiffError::GenericError(format!(
                    "strip {} of page {} holds {} samples, expected {}",
                    strip_idx, ifd.number, samples.len(), expected
                )));
            }
            samples.truncate(expected);

            if predictor_code == predictor::HORIZONTAL_DIFFERENCING {
                apply_horizontal_predictor(&mut samples, layout.width, layout.bits_per_sample);
            }

            trace!("Strip {} decoded to {} samples", strip_idx, samples.len());
            plane.extend_from_slice(&samples);
        }

        if plane.len() != layout.width * layout.height {
            return Err(TiffError::GenericError(format!(
                "page {} decoded to {} samples, expected {}",
                ifd.number, plane.len(), layout.width * layout.height
            )));
        }

        Ok(plane)
    }

    /// Read and decompress a single strip
    fn read_strip(&mut self, offset: u64, byte_count: u64, handler: &dyn CompressionHandler) -> TiffResult<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut compressed_data = vec![0u8; byte_count as usize];
        self.reader.read_exact(&mut compressed_data)?;
        handler.decompress(&compressed_data)
    }
}

/// Undo horizontal differencing row by row
///
/// Sums wrap at the sample width, as the predictor was applied modulo 2^bits.
pub fn apply_horizontal_predictor(samples: &mut [u16], width: usize, bits_per_sample: u16) {
    if width == 0 {
        return;
    }

    for row in samples.chunks_mut(width) {
        for i in 1..row.len() {
            row[i] = if bits_per_sample == 8 {
                (row[i] as u8).wrapping_add(row[i - 1] as u8) as u16
            } else {
                row[i].wrapping_add(row[i - 1])
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_predictor_16_bit() {
        let mut samples = vec![10, 1, 1, 65535, 5, 5];
        apply_horizontal_predictor(&mut samples, 3, 16);
        assert_eq!(samples, vec![10, 11, 12, 65535, 4, 9]);
    }

    #[test]
    fn test_horizontal_predictor_8_bit_wraps() {
        let mut samples = vec![250, 10];
        apply_horizontal_predictor(&mut samples, 2, 8);
        assert_eq!(samples, vec![250, 4]);
    }
}

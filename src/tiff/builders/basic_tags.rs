//! Basic TIFF tag strategies
//!
//! This module provides functionality for adding the tags every grayscale
//! hyperstack page needs: dimensions, sample layout, compression and strip
//! bookkeeping.

use std::collections::BTreeMap;

use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::constants::{tags, field_types, photometric, planar_config, sample_format};
use log::debug;

/// Adds basic TIFF tags to an IFD
pub struct BasicTagsBuilder;

impl BasicTagsBuilder {
    /// Add common tags for a single-sample grayscale page
    ///
    /// Microscopy planes are stored as unsigned integers, one sample per
    /// pixel, BlackIsZero.
    pub fn add_basic_gray_tags(
        ifd: &mut IFD,
        width: u32,
        height: u32,
        bits_per_sample: u16,
        compression_code: u64
    ) {
        debug!("Adding grayscale tags for {}x{} page, {} bits, compression {}",
               width, height, bits_per_sample, compression_code);

        ifd.add_entry(IFDEntry::new(
            tags::IMAGE_WIDTH,
            field_types::LONG,
            1,
            width as u64)
        );

        ifd.add_entry(IFDEntry::new(
            tags::IMAGE_LENGTH,
            field_types::LONG,
            1,
            height as u64)
        );

        ifd.add_entry(IFDEntry::new(
            tags::BITS_PER_SAMPLE,
            field_types::SHORT,
            1,
            bits_per_sample as u64)
        );

        ifd.add_entry(IFDEntry::new(
            tags::COMPRESSION,
            field_types::SHORT,
            1,
            compression_code)
        );

        ifd.add_entry(IFDEntry::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            field_types::SHORT,
            1,
            photometric::BLACK_IS_ZERO as u64)
        );

        ifd.add_entry(IFDEntry::new(
            tags::SAMPLES_PER_PIXEL,
            field_types::SHORT,
            1,
            1)
        );

        ifd.add_entry(IFDEntry::new(
            tags::PLANAR_CONFIGURATION,
            field_types::SHORT,
            1,
            planar_config::CHUNKY as u64)
        );

        ifd.add_entry(IFDEntry::new(
            tags::SAMPLE_FORMAT,
            field_types::SHORT,
            1,
            sample_format::UNSIGNED as u64)
        );
    }

    /// Setup a single strip holding the whole page
    ///
    /// The StripOffsets value is a placeholder; the writer patches in the
    /// real offset once the file layout is known.
    pub fn setup_single_strip(
        ifd: &mut IFD,
        image_data: &mut BTreeMap<usize, Vec<u8>>,
        ifd_index: usize,
        strip_data: Vec<u8>,
        is_big_tiff: bool
    ) {
        debug!("Setting up single strip: {} bytes", strip_data.len());

        let offset_type = if is_big_tiff { field_types::LONG8 } else { field_types::LONG };

        ifd.add_entry(IFDEntry::new(
            tags::STRIP_OFFSETS,
            offset_type,
            1,
            0)
        );

        ifd.add_entry(IFDEntry::new(
            tags::STRIP_BYTE_COUNTS,
            offset_type,
            1,
            strip_data.len() as u64)
        );

        // RowsPerStrip equals the page height for a single-strip page
        if let Some((_, height)) = ifd.get_dimensions() {
            ifd.add_entry(IFDEntry::new(
                tags::ROWS_PER_STRIP,
                field_types::LONG,
                1,
                height)
            );
        }

        image_data.insert(ifd_index, strip_data);
    }

    /// Add an ASCII tag such as ImageDescription or Software
    ///
    /// Strings that do not fit in the entry itself go to external data.
    pub fn add_ascii_tag(
        ifd: &mut IFD,
        external_data: &mut BTreeMap<(usize, u16), Vec<u8>>,
        ifd_index: usize,
        tag: u16,
        value: &str,
        is_big_tiff: bool
    ) {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        let count = bytes.len() as u64;
        let inline_size = if is_big_tiff { 8 } else { 4 };

        if bytes.len() <= inline_size {
            let mut packed = [0u8; 8];
            packed[..bytes.len()].copy_from_slice(&bytes);
            ifd.add_entry(IFDEntry::new(tag, field_types::ASCII, count, u64::from_le_bytes(packed)));
        } else {
            ifd.add_entry(IFDEntry::new(tag, field_types::ASCII, count, 0));
            external_data.insert((ifd_index, tag), bytes);
        }
    }
}

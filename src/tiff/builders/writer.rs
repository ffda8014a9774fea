//! TIFF writing strategies
//!
//! Writing a valid TIFF requires careful management of offsets, ordering,
//! and alignment. The layout used here is: header, all IFDs, external tag
//! data, then strip data in page order.

use crate::tiff::ifd::IFD;
use crate::tiff::errors::TiffResult;
use crate::tiff::constants::{header, tags};
use crate::utils::write_utils;
use log::debug;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// Handles writing TIFF files to disk
pub struct WriterBuilder;

impl WriterBuilder {
    /// Write a complete TIFF file to disk, creating parent directories
    pub fn write(
        is_big_tiff: bool,
        ifds: &[IFD],
        image_data: &BTreeMap<usize, Vec<u8>>,
        external_data: &BTreeMap<(usize, u16), Vec<u8>>,
        output_path: &Path
    ) -> TiffResult<()> {
        debug!("Writing TIFF to {}", output_path.display());

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(output_path)?;
        let mut writer = BufWriter::with_capacity(1024 * 1024, file);
        Self::write_to(&mut writer, is_big_tiff, ifds, image_data, external_data)?;
        writer.flush()?;
        Ok(())
    }

    /// Write a complete TIFF into any seekable sink
    pub fn write_to(
        writer: &mut (impl Write + Seek),
        is_big_tiff: bool,
        ifds: &[IFD],
        image_data: &BTreeMap<usize, Vec<u8>>,
        external_data: &BTreeMap<(usize, u16), Vec<u8>>,
    ) -> TiffResult<()> {
        // Tags must be sorted by number within each IFD
        let sorted_ifds = Self::prepare_sorted_ifds(ifds);

        Self::write_header(writer, is_big_tiff)?;

        let header_size = if is_big_tiff { 16 } else { 8 };
        let (ifd_offsets, tag_data_offsets) = Self::calculate_offsets(
            &sorted_ifds, external_data, image_data, header_size, is_big_tiff);

        let first_ifd_offset = ifd_offsets.first().copied().unwrap_or(0);
        Self::write_first_ifd_offset(writer, first_ifd_offset, is_big_tiff)?;

        Self::write_ifds(writer, &sorted_ifds, &ifd_offsets, &tag_data_offsets, is_big_tiff)?;
        Self::write_external_data(writer, external_data, &tag_data_offsets)?;
        Self::write_image_data(writer, image_data, &tag_data_offsets)?;

        Ok(())
    }

    /// Prepare sorted IFDs with unique tags
    fn prepare_sorted_ifds(ifds: &[IFD]) -> Vec<IFD> {
        ifds.iter().map(|ifd| {
            let mut sorted_ifd = ifd.clone();
            sorted_ifd.entries = write_utils::get_unique_sorted_entries(&ifd.entries);
            sorted_ifd
        }).collect()
    }

    /// Total number of bytes the file will take
    ///
    /// Used to decide whether classic TIFF offsets are wide enough.
    pub fn estimate_size(
        ifd_count: usize,
        entries_per_ifd: usize,
        image_bytes: u64,
        external_bytes: u64,
        is_big_tiff: bool
    ) -> u64 {
        let header_size = if is_big_tiff { 16 } else { 8 };
        let ifd_size = if is_big_tiff {
            16 + 20 * entries_per_ifd as u64
        } else {
            6 + 12 * entries_per_ifd as u64
        };
        header_size + ifd_count as u64 * (ifd_size + 4) + image_bytes + external_bytes
    }

    /// Calculate offsets for IFDs, external tag data and strip data
    fn calculate_offsets(
        sorted_ifds: &[IFD],
        external_data: &BTreeMap<(usize, u16), Vec<u8>>,
        image_data: &BTreeMap<usize, Vec<u8>>,
        header_size: u64,
        is_big_tiff: bool
    ) -> (Vec<u64>, BTreeMap<(usize, u16), u64>) {
        let mut current_offset = header_size;
        let mut ifd_offsets = Vec::with_capacity(sorted_ifds.len());
        let mut tag_data_offsets = BTreeMap::new();

        for ifd in sorted_ifds {
            ifd_offsets.push(current_offset);
            current_offset += Self::calculate_ifd_size(ifd, is_big_tiff);
            current_offset = write_utils::align_to_4_bytes(current_offset);
        }

        for ((ifd_index, tag), data) in external_data {
            tag_data_offsets.insert((*ifd_index, *tag), current_offset);
            current_offset += data.len() as u64;
            current_offset = write_utils::align_to_4_bytes(current_offset);
        }

        for (ifd_index, data) in image_data {
            if let Some(ifd) = sorted_ifds.get(*ifd_index) {
                if ifd.has_tag(tags::STRIP_OFFSETS) {
                    tag_data_offsets.insert((*ifd_index, tags::STRIP_OFFSETS), current_offset);
                }
            }

            current_offset += data.len() as u64;
            current_offset = write_utils::align_to_4_bytes(current_offset);
        }

        (ifd_offsets, tag_data_offsets)
    }

    /// Write TIFF header
    ///
    /// Byte order marker, version (42 or 43) and a placeholder for the
    /// first IFD offset. Output is always little-endian.
    fn write_header(writer: &mut impl Write, is_big_tiff: bool) -> TiffResult<()> {
        writer.write_all(&header::LITTLE_ENDIAN_MARKER)?;

        if is_big_tiff {
            writer.write_all(&header::BIG_TIFF_VERSION.to_le_bytes())?;
            writer.write_all(&header::BIGTIFF_OFFSET_SIZE.to_le_bytes())?;
            writer.write_all(&[0u8, 0])?;  // Reserved (always 0)
            writer.write_all(&[0u8; 8])?;
        } else {
            writer.write_all(&header::TIFF_VERSION.to_le_bytes())?;
            writer.write_all(&[0u8; 4])?;
        }

        Ok(())
    }

    /// Calculate size of an IFD
    fn calculate_ifd_size(ifd: &IFD, is_big_tiff: bool) -> u64 {
        let entries_count = ifd.entries.len() as u64;

        if is_big_tiff {
            // count (8) + entries (20 each) + next offset (8)
            8 + (20 * entries_count) + 8
        } else {
            // count (2) + entries (12 each) + next offset (4)
            2 + (12 * entries_count) + 4
        }
    }

    /// Patch the first IFD offset into the header
    fn write_first_ifd_offset(writer: &mut (impl Write + Seek), offset: u64, is_big_tiff: bool) -> TiffResult<()> {
        let position = if is_big_tiff { 8 } else { 4 };
        writer.seek(SeekFrom::Start(position))?;

        if is_big_tiff {
            writer.write_all(&offset.to_le_bytes())?;
        } else {
            writer.write_all(&(offset as u32).to_le_bytes())?;
        }

        Ok(())
    }

    /// Write all IFDs to the file
    fn write_ifds(
        writer: &mut (impl Write + Seek),
        sorted_ifds: &[IFD],
        ifd_offsets: &[u64],
        tag_data_offsets: &BTreeMap<(usize, u16), u64>,
        is_big_tiff: bool
    ) -> TiffResult<()> {
        for (i, ifd) in sorted_ifds.iter().enumerate() {
            let next_ifd_offset = ifd_offsets.get(i + 1).copied().unwrap_or(0);
            writer.seek(SeekFrom::Start(ifd_offsets[i]))?;
            Self::write_ifd(writer, ifd, next_ifd_offset, tag_data_offsets, i, is_big_tiff)?;
        }

        Ok(())
    }

    /// Write all external tag data
    fn write_external_data(
        writer: &mut (impl Write + Seek),
        external_data: &BTreeMap<(usize, u16), Vec<u8>>,
        tag_data_offsets: &BTreeMap<(usize, u16), u64>
    ) -> TiffResult<()> {
        for (key, data) in external_data {
            if let Some(offset) = tag_data_offsets.get(key) {
                writer.seek(SeekFrom::Start(*offset))?;
                writer.write_all(data)?;
                write_utils::write_padding(writer, data.len())?;
            }
        }

        Ok(())
    }

    /// Write all strip data
    fn write_image_data(
        writer: &mut (impl Write + Seek),
        image_data: &BTreeMap<usize, Vec<u8>>,
        tag_data_offsets: &BTreeMap<(usize, u16), u64>
    ) -> TiffResult<()> {
        for (ifd_index, data) in image_data {
            if let Some(file_offset) = tag_data_offsets.get(&(*ifd_index, tags::STRIP_OFFSETS)) {
                writer.seek(SeekFrom::Start(*file_offset))?;
                writer.write_all(data)?;
                write_utils::write_padding(writer, data.len())?;
            }
        }

        Ok(())
    }

    /// Write one IFD
    ///
    /// Entries whose data lives elsewhere get their real offset from
    /// `tag_offsets`; all others keep their inline value.
    fn write_ifd(
        writer: &mut (impl Write + Seek),
        ifd: &IFD,
        next_offset: u64,
        tag_offsets: &BTreeMap<(usize, u16), u64>,
        ifd_index: usize,
        is_big_tiff: bool
    ) -> TiffResult<()> {
        if is_big_tiff {
            writer.write_all(&(ifd.entries.len() as u64).to_le_bytes())?;
        } else {
            writer.write_all(&(ifd.entries.len() as u16).to_le_bytes())?;
        }

        for entry in &ifd.entries {
            let value_offset = tag_offsets.get(&(ifd_index, entry.tag))
                .copied()
                .unwrap_or(entry.value_offset);

            writer.write_all(&entry.tag.to_le_bytes())?;
            writer.write_all(&entry.field_type.to_le_bytes())?;

            if is_big_tiff {
                writer.write_all(&entry.count.to_le_bytes())?;
                writer.write_all(&value_offset.to_le_bytes())?;
            } else {
                writer.write_all(&(entry.count as u32).to_le_bytes())?;
                writer.write_all(&(value_offset as u32).to_le_bytes())?;
            }
        }

        if is_big_tiff {
            writer.write_all(&next_offset.to_le_bytes())?;
        } else {
            writer.write_all(&(next_offset as u32).to_le_bytes())?;
        }

        Ok(())
    }
}

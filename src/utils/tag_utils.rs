//! TIFF tag utilities
//!
//! Utilities for working with TIFF tags and their values.

use byteorder::ReadBytesExt;

use crate::io::seekable::SeekableReader;
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFDEntry;
use crate::tiff::constants::{field_types, tags, compression};

/// Reads an array of tag values based on the field type
///
/// # Arguments
/// * `reader` - The seekable reader to use
/// * `entry` - The IFD entry with tag information
/// * `handler` - The byte order handler
/// * `values` - The vector to store values in
///
/// # Returns
/// Result indicating success or failure
pub fn read_tag_value_array(
    reader: &mut dyn SeekableReader,
    entry: &IFDEntry,
    handler: &dyn ByteOrderHandler,
    values: &mut Vec<u64>
) -> TiffResult<()> {
    for _ in 0..entry.count {
        let value = match entry.field_type {
            field_types::BYTE | field_types::SBYTE | field_types::UNDEFINED => reader.read_u8()? as u64,
            field_types::SHORT | field_types::SSHORT => handler.read_u16(reader)? as u64,
            field_types::LONG | field_types::SLONG | field_types::FLOAT => handler.read_u32(reader)? as u64,
            field_types::RATIONAL | field_types::SRATIONAL => {
                let (num, den) = handler.read_rational(reader)?;
                ((num as u64) << 32) | (den as u64)
            },
            field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 => handler.read_u64(reader)?,
            _ => return Err(TiffError::UnsupportedFieldType(entry.field_type)),
        };

        values.push(value);
    }

    Ok(())
}

/// Size in bytes of one value of the given field type
pub fn field_type_size(field_type: u16) -> u64 {
    match field_type {
        field_types::BYTE | field_types::SBYTE | field_types::UNDEFINED | field_types::ASCII => 1,
        field_types::SHORT | field_types::SSHORT => 2,
        field_types::LONG | field_types::SLONG | field_types::FLOAT => 4,
        field_types::RATIONAL | field_types::SRATIONAL | field_types::DOUBLE |
        field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 => 8,
        _ => 1, // Default for unknown types
    }
}

/// Determines if a tag's value is stored inline or at an offset
///
/// # Arguments
/// * `entry` - The IFD entry to check
/// * `is_big_tiff` - Whether the file is BigTIFF format
///
/// # Returns
/// true if the value is stored inline, false if it's at an offset
pub fn is_value_inline(entry: &IFDEntry, is_big_tiff: bool) -> bool {
    let total_size = field_type_size(entry.field_type) * entry.count;

    if is_big_tiff {
        total_size <= 8 // In BigTIFF, 8 bytes are available for inline storage
    } else {
        total_size <= 4 // In standard TIFF, 4 bytes are available for inline storage
    }
}

/// Unpacks the values stored inline in an entry's value field
///
/// The value field was read as a single integer in the file's byte order,
/// so packed SHORT or BYTE values have to be split back out of it.
pub fn decode_inline_values(entry: &IFDEntry, is_big_tiff: bool, byte_order: ByteOrder) -> Vec<u64> {
    let raw: Vec<u8> = match (is_big_tiff, byte_order) {
        (true, ByteOrder::LittleEndian) => entry.value_offset.to_le_bytes().to_vec(),
        (true, ByteOrder::BigEndian) => entry.value_offset.to_be_bytes().to_vec(),
        (false, ByteOrder::LittleEndian) => (entry.value_offset as u32).to_le_bytes().to_vec(),
        (false, ByteOrder::BigEndian) => (entry.value_offset as u32).to_be_bytes().to_vec(),
    };

    let size = field_type_size(entry.field_type) as usize;
    (0..entry.count as usize)
        .map(|i| {
            let chunk = &raw[i * size..(i + 1) * size];
            chunk_to_u64(chunk, byte_order)
        })
        .collect()
}

fn chunk_to_u64(chunk: &[u8], byte_order: ByteOrder) -> u64 {
    match byte_order {
        ByteOrder::LittleEndian => chunk.iter().rev().fold(0u64, |acc, &b| (acc << 8) | b as u64),
        ByteOrder::BigEndian => chunk.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
    }
}

/// Get the name of a TIFF tag
///
/// Returns a human-readable name for a tag based on its numeric ID.
/// If the tag is not recognized, returns "Unknown".
pub fn get_tag_name(tag: u16) -> &'static str {
    match tag {
        tags::NEW_SUBFILE_TYPE => "NewSubfileType",
        tags::IMAGE_WIDTH => "ImageWidth",
        tags::IMAGE_LENGTH => "ImageLength",
        tags::BITS_PER_SAMPLE => "BitsPerSample",
        tags::COMPRESSION => "Compression",
        tags::PHOTOMETRIC_INTERPRETATION => "PhotometricInterpretation",
        tags::IMAGE_DESCRIPTION => "ImageDescription",
        tags::STRIP_OFFSETS => "StripOffsets",
        tags::SAMPLES_PER_PIXEL => "SamplesPerPixel",
        tags::ROWS_PER_STRIP => "RowsPerStrip",
        tags::STRIP_BYTE_COUNTS => "StripByteCounts",
        tags::PLANAR_CONFIGURATION => "PlanarConfiguration",
        tags::SOFTWARE => "Software",
        tags::PREDICTOR => "Predictor",
        tags::TILE_OFFSETS => "TileOffsets",
        tags::SAMPLE_FORMAT => "SampleFormat",
        _ => "Unknown",
    }
}

/// Get the name of a TIFF field type
pub fn get_field_type_name(field_type: u16) -> &'static str {
    match field_type {
        field_types::BYTE => "BYTE",
        field_types::ASCII => "ASCII",
        field_types::SHORT => "SHORT",
        field_types::LONG => "LONG",
        field_types::RATIONAL => "RATIONAL",
        field_types::SBYTE => "SBYTE",
        field_types::UNDEFINED => "UNDEFINED",
        field_types::SSHORT => "SSHORT",
        field_types::SLONG => "SLONG",
        field_types::SRATIONAL => "SRATIONAL",
        field_types::FLOAT => "FLOAT",
        field_types::DOUBLE => "DOUBLE",
        field_types::LONG8 => "LONG8",
        field_types::SLONG8 => "SLONG8",
        field_types::IFD8 => "IFD8",
        _ => "Unknown",
    }
}

/// Get the name of a compression method
pub fn get_compression_name(compression_code: u64) -> &'static str {
    match compression_code as u16 {
        compression::NONE => "None",
        compression::LZW => "LZW",
        compression::DEFLATE => "Adobe Deflate",
        compression::ZSTD => "Zstandard",
        compression::PACKBITS => "PackBits",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_inline_shorts_little_endian() {
        // Two SHORT values 3 and 7 packed into the 4-byte field
        let entry = IFDEntry::new(tags::BITS_PER_SAMPLE, field_types::SHORT, 2, 0x0007_0003);
        let values = decode_inline_values(&entry, false, ByteOrder::LittleEndian);
        assert_eq!(values, vec![3, 7]);
    }

    #[test]
    fn test_decode_inline_short_big_endian() {
        // A big-endian SHORT sits in the high half of the field
        let entry = IFDEntry::new(tags::IMAGE_WIDTH, field_types::SHORT, 1, 0x0200_0000);
        let values = decode_inline_values(&entry, false, ByteOrder::BigEndian);
        assert_eq!(values, vec![512]);
    }

    #[test]
    fn test_decode_inline_long() {
        let entry = IFDEntry::new(tags::STRIP_OFFSETS, field_types::LONG, 1, 1234);
        assert_eq!(decode_inline_values(&entry, false, ByteOrder::LittleEndian), vec![1234]);
        assert_eq!(decode_inline_values(&entry, false, ByteOrder::BigEndian), vec![1234]);
    }
}

//! TIFF and BigTIFF file headers
//!
//! The header fixes the byte order, the offset width used by every IFD and
//! the position of the first IFD.

use log::{debug, warn};
use std::io::{Seek, SeekFrom};

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::header;
use crate::tiff::errors::{TiffError, TiffResult};

/// Parsed file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    pub byte_order: ByteOrder,
    pub is_big_tiff: bool,
    pub first_ifd_offset: u64,
}

impl TiffHeader {
    /// Read the header from the start of a file
    ///
    /// # Arguments
    /// * `reader` - Reader positioned at the first byte of the file
    ///
    /// # Returns
    /// The header, or an error for unknown byte order marks, versions
    /// and malformed BigTIFF headers
    pub fn read(reader: &mut dyn SeekableReader) -> TiffResult<Self> {
        let byte_order = ByteOrder::detect(reader)?;
        let handler = byte_order.create_handler();

        let is_big_tiff = match handler.read_u16(reader)? {
            header::TIFF_VERSION => false,
            header::BIG_TIFF_VERSION => {
                let offset_size = handler.read_u16(reader)?;
                let reserved = handler.read_u16(reader)?;
                if offset_size != header::BIGTIFF_OFFSET_SIZE || reserved != 0 {
                    warn!("BigTIFF header has offset size {} and reserved field {}", offset_size, reserved);
                    return Err(TiffError::InvalidBigTIFFHeader);
                }
                true
            },
            version => return Err(TiffError::UnsupportedVersion(version)),
        };

        let first_ifd_offset = read_offset(reader, is_big_tiff, handler.as_ref())?;
        debug!("{} {} header, first IFD at {}",
               byte_order.name(), if is_big_tiff { "BigTIFF" } else { "TIFF" }, first_ifd_offset);

        Ok(TiffHeader {
            byte_order,
            is_big_tiff,
            first_ifd_offset,
        })
    }

    /// Size of the header in bytes
    pub fn size(&self) -> u64 {
        if self.is_big_tiff { 16 } else { 8 }
    }
}

/// Read one IFD offset, 8 bytes wide in BigTIFF and 4 bytes otherwise
pub fn read_offset(
    reader: &mut dyn SeekableReader,
    is_big_tiff: bool,
    handler: &dyn ByteOrderHandler
) -> TiffResult<u64> {
    if is_big_tiff {
        Ok(handler.read_u64(reader)?)
    } else {
        Ok(handler.read_u32(reader)? as u64)
    }
}

/// Length of the stream, leaving the read position untouched
///
/// Streams that cannot seek to their end report `u64::MAX`.
pub fn stream_len(reader: &mut dyn SeekableReader) -> TiffResult<u64> {
    let position = reader.stream_position()?;
    let len = match reader.seek(SeekFrom::End(0)) {
        Ok(len) => len,
        Err(e) => {
            warn!("Could not determine stream length: {}", e);
            u64::MAX
        }
    };
    reader.seek(SeekFrom::Start(position))?;
    Ok(len)
}

/// Offsets must point past the header and inside the stream
pub fn check_ifd_offset(offset: u64, header: &TiffHeader, stream_len: u64) -> TiffResult<()> {
    if offset < header.size() || offset >= stream_len {
        return Err(TiffError::GenericError(format!(
            "IFD offset {} outside of the file (length {})", offset, stream_len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_classic_header() {
        let bytes = [0x49, 0x49, 42, 0, 8, 0, 0, 0, 0, 0];
        let header = TiffHeader::read(&mut Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(header.byte_order, ByteOrder::LittleEndian);
        assert!(!header.is_big_tiff);
        assert_eq!(header.first_ifd_offset, 8);
        assert!(check_ifd_offset(8, &header, bytes.len() as u64).is_ok());
        assert!(check_ifd_offset(4, &header, bytes.len() as u64).is_err());
        assert!(check_ifd_offset(10, &header, bytes.len() as u64).is_err());
    }

    #[test]
    fn test_big_endian_bigtiff_header() {
        let mut bytes = vec![0x4D, 0x4D, 0, 43, 0, 8, 0, 0];
        bytes.extend_from_slice(&16u64.to_be_bytes());
        let header = TiffHeader::read(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(header.byte_order, ByteOrder::BigEndian);
        assert!(header.is_big_tiff);
        assert_eq!(header.first_ifd_offset, 16);
        assert_eq!(header.size(), 16);
    }

    #[test]
    fn test_rejects_bad_headers() {
        let bad_version = [0x49, 0x49, 41, 0, 8, 0, 0, 0];
        assert!(matches!(
            TiffHeader::read(&mut Cursor::new(bad_version.to_vec())),
            Err(TiffError::UnsupportedVersion(41))
        ));

        let bad_bigtiff = [0x49, 0x49, 43, 0, 4, 0, 0, 0, 16, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            TiffHeader::read(&mut Cursor::new(bad_bigtiff.to_vec())),
            Err(TiffError::InvalidBigTIFFHeader)
        ));
    }
}

//! TIFF file reader implementation
//!
//! This module implements the TIFF/BigTIFF file reader that uses the
//! Strategy pattern to handle different byte orders.

use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, SeekFrom};
use std::path::Path;

use crate::io::seekable::SeekableReader;
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::TIFF;
use crate::tiff::header::{self, TiffHeader};
use crate::tiff::constants::field_types;
use crate::utils::tag_utils;

/// Upper bound on the IFD chain length, guards against offset loops
const MAX_IFDS: usize = 100_000;

/// Reader for TIFF and BigTIFF files
pub struct TiffReader {
    /// Byte order of the current file
    byte_order: Option<ByteOrder>,
    /// Current byte order handler
    byte_order_handler: Option<Box<dyn ByteOrderHandler>>,
    /// Current file path
    current_file: Option<String>,
    /// Whether currently reading BigTIFF format
    is_big_tiff: bool,
}

impl Default for TiffReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffReader {
    /// Creates a new TIFF reader
    pub fn new() -> Self {
        TiffReader {
            byte_order: None,
            byte_order_handler: None,
            current_file: None,
            is_big_tiff: false,
        }
    }

    /// Opens the current file for reading
    pub(crate) fn create_reader(&self) -> TiffResult<BufReader<File>> {
        match &self.current_file {
            Some(path) => {
                let file = File::open(path)?;
                Ok(BufReader::with_capacity(1024 * 1024, file))
            },
            None => Err(TiffError::GenericError("No file path specified".to_string()))
        }
    }

    fn handler(&self) -> TiffResult<&dyn ByteOrderHandler> {
        self.byte_order_handler.as_deref()
            .ok_or_else(|| TiffError::GenericError("Byte order not yet determined".to_string()))
    }

    /// Byte order of the last file read
    pub fn byte_order(&self) -> TiffResult<ByteOrder> {
        self.byte_order
            .ok_or_else(|| TiffError::GenericError("Byte order not yet determined".to_string()))
    }

    /// Loads a TIFF file from the given path
    ///
    /// # Arguments
    /// * `filepath` - Path to the TIFF file to load
    ///
    /// # Returns
    /// A TIFF structure containing the file's IFDs
    pub fn load(&mut self, filepath: &str) -> TiffResult<TIFF> {
        info!("Loading TIFF file: {}", filepath);
        self.current_file = Some(filepath.to_string());

        let file = File::open(Path::new(filepath))?;
        let mut reader = BufReader::with_capacity(1024 * 1024, file);

        self.read(&mut reader)
    }

    /// Reads a TIFF file from the given reader
    ///
    /// Detects the byte order, checks for TIFF or BigTIFF and reads the
    /// whole IFD chain.
    pub fn read(&mut self, reader: &mut dyn SeekableReader) -> TiffResult<TIFF> {
        debug!("Reader::read starting");

        let header = TiffHeader::read(reader)?;
        self.byte_order = Some(header.byte_order);
        self.byte_order_handler = Some(header.byte_order.create_handler());
        self.is_big_tiff = header.is_big_tiff;

        let stream_len = header::stream_len(reader)?;
        header::check_ifd_offset(header.first_ifd_offset, &header, stream_len)?;

        let mut tiff = TIFF::new(self.is_big_tiff);
        tiff.ifds = self.read_ifd_chain(reader, &header, stream_len)?;

        debug!("Read {} IFDs from TIFF file", tiff.ifds.len());
        Ok(tiff)
    }

    /// Follows the IFD chain from the header's first offset
    ///
    /// A next offset outside the stream ends the chain with a warning
    /// instead of failing the pages already read.
    fn read_ifd_chain(&self, reader: &mut dyn SeekableReader, header: &TiffHeader, stream_len: u64) -> TiffResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut ifd_offset = header.first_ifd_offset;
        let handler = self.handler()?;

        while ifd_offset != 0 {
            if ifds.len() == MAX_IFDS {
                warn!("Stopping after {} IFDs", MAX_IFDS);
                break;
            }

            // The next offset directly follows the last entry
            let ifd = self.read_ifd(reader, ifd_offset, ifds.len())?;
            let next_ifd_offset = header::read_offset(reader, self.is_big_tiff, handler)?;
            ifds.push(ifd);

            if next_ifd_offset != 0 && header::check_ifd_offset(next_ifd_offset, header, stream_len).is_err() {
                warn!("Invalid next IFD offset {}, stopping IFD chain", next_ifd_offset);
                break;
            }
            ifd_offset = next_ifd_offset;
        }

        Ok(ifds)
    }

    /// Reads an IFD from the reader
    ///
    /// # Arguments
    /// * `reader` - The seekable reader to use
    /// * `offset` - Offset in the file where the IFD starts
    /// * `number` - The index of this IFD in the file
    pub fn read_ifd(&self, reader: &mut dyn SeekableReader, offset: u64, number: usize) -> TiffResult<IFD> {
        reader.seek(SeekFrom::Start(offset))?;

        let handler = self.handler()?;
        let entry_count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u16(reader)? as u64
        };

        let mut ifd = IFD::new(number, offset);
        for _ in 0..entry_count {
            let entry = self.read_ifd_entry(reader)?;
            ifd.add_entry(entry);
        }

        Ok(ifd)
    }

    /// Reads a single IFD entry
    fn read_ifd_entry(&self, reader: &mut dyn SeekableReader) -> TiffResult<IFDEntry> {
        let handler = self.handler()?;

        let tag = handler.read_u16(reader)?;
        let field_type = handler.read_u16(reader)?;
        let (count, value_offset) = if self.is_big_tiff {
            (handler.read_u64(reader)?, handler.read_u64(reader)?)
        } else {
            (handler.read_u32(reader)? as u64, handler.read_u32(reader)? as u64)
        };

        let mut entry = IFDEntry::new(tag, field_type, count, value_offset);

        // Single inline numbers sit left-justified in the value field; store
        // the number itself so `IFD::get_tag_value` works for either byte order
        if Self::holds_single_inline_number(&entry, self.is_big_tiff) {
            entry.value_offset = tag_utils::decode_inline_values(&entry, self.is_big_tiff, self.byte_order()?)
                .first()
                .copied()
                .unwrap_or(value_offset);
        }

        Ok(entry)
    }

    fn holds_single_inline_number(entry: &IFDEntry, is_big_tiff: bool) -> bool {
        entry.count == 1
            && entry.field_type != field_types::ASCII
            && tag_utils::is_value_inline(entry, is_big_tiff)
    }

    /// Reads a tag's values as a vector of u64
    ///
    /// Handles both inline and out-of-line storage.
    pub fn read_tag_values(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<u64>> {
        let entry = ifd.get_entry(tag)
            .ok_or(TiffError::TagNotFound(tag))?;

        if Self::holds_single_inline_number(entry, self.is_big_tiff) {
            return Ok(vec![entry.value_offset]);
        }

        if tag_utils::is_value_inline(entry, self.is_big_tiff) {
            return Ok(tag_utils::decode_inline_values(entry, self.is_big_tiff, self.byte_order()?));
        }

        let mut values = Vec::with_capacity(entry.count as usize);
        reader.seek(SeekFrom::Start(entry.value_offset))?;
        tag_utils::read_tag_value_array(reader, entry, self.handler()?, &mut values)?;
        Ok(values)
    }

    /// Reads an ASCII tag, returning None when the tag is absent
    pub fn read_ascii_tag(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Option<String>> {
        let Some(entry) = ifd.get_entry(tag) else {
            return Ok(None);
        };

        if entry.field_type != field_types::ASCII {
            warn!("Tag {} is not ASCII (type {}), ignoring", tag, entry.field_type);
            return Ok(None);
        }

        if tag_utils::is_value_inline(entry, self.is_big_tiff) {
            let bytes: Vec<u8> = tag_utils::decode_inline_values(entry, self.is_big_tiff, self.byte_order()?)
                .into_iter()
                .map(|b| b as u8)
                .collect();
            return Self::bytes_to_string(bytes).map(Some);
        }

        reader.seek(SeekFrom::Start(entry.value_offset))?;
        self.read_ascii_string(reader, entry.count).map(Some)
    }

    /// Reads an ASCII string, trailing null characters removed
    pub fn read_ascii_string(&self, reader: &mut dyn SeekableReader, count: u64) -> TiffResult<String> {
        let mut buffer = vec![0u8; count as usize];
        reader.read_exact(&mut buffer)?;
        Self::bytes_to_string(buffer)
    }

    fn bytes_to_string(mut buffer: Vec<u8>) -> TiffResult<String> {
        while buffer.last() == Some(&0) {
            buffer.pop();
        }

        String::from_utf8(buffer)
            .map_err(|e| TiffError::GenericError(format!("Invalid UTF-8 string: {}", e)))
    }

    /// Returns whether the current file is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }
}

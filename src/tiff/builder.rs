//! TIFF file construction utilities
//!
//! Collects IFDs, strip data and out-of-line tag data for a multi-page
//! TIFF and hands them to the writer.

use std::collections::BTreeMap;
use std::io::{Seek, Write};
use std::path::Path;
use log::{debug, error};

use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::utils::logger::Logger;

use crate::tiff::builders::basic_tags::BasicTagsBuilder;
use crate::tiff::builders::writer::WriterBuilder;

/// Builder for creating TIFF files
pub struct TiffBuilder<'a> {
    logger: &'a Logger,
    is_big_tiff: bool,
    pub ifds: Vec<IFD>,
    image_data: BTreeMap<usize, Vec<u8>>,
    external_data: BTreeMap<(usize, u16), Vec<u8>>,
}

impl<'a> TiffBuilder<'a> {
    /// Create a new TIFF builder
    pub fn new(logger: &'a Logger, is_big_tiff: bool) -> Self {
        debug!("Creating new TiffBuilder (is_big_tiff: {})", is_big_tiff);
        TiffBuilder {
            logger,
            is_big_tiff,
            ifds: Vec::new(),
            image_data: BTreeMap::new(),
            external_data: BTreeMap::new(),
        }
    }

    /// Whether the file will be written as BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Add an IFD to the TIFF, returning its index
    pub fn add_ifd(&mut self, ifd: IFD) -> usize {
        let ifd_index = self.ifds.len();
        self.ifds.push(ifd);
        ifd_index
    }

    fn check_index(&self, ifd_index: usize) -> bool {
        if ifd_index >= self.ifds.len() {
            error!("Invalid IFD index {}, only have {} IFDs", ifd_index, self.ifds.len());
            return false;
        }
        true
    }

    /// Add common tags for a grayscale page
    pub fn add_basic_gray_tags(&mut self, ifd_index: usize, width: u32, height: u32, bits_per_sample: u16, compression_code: u64) {
        if !self.check_index(ifd_index) {
            return;
        }

        BasicTagsBuilder::add_basic_gray_tags(
            &mut self.ifds[ifd_index],
            width,
            height,
            bits_per_sample,
            compression_code
        );
    }

    /// Set up a single strip for page data
    pub fn setup_single_strip(&mut self, ifd_index: usize, strip_data: Vec<u8>) {
        if !self.check_index(ifd_index) {
            return;
        }

        BasicTagsBuilder::setup_single_strip(
            &mut self.ifds[ifd_index],
            &mut self.image_data,
            ifd_index,
            strip_data,
            self.is_big_tiff
        );
    }

    /// Add an ASCII tag to an IFD
    pub fn add_ascii_tag(&mut self, ifd_index: usize, tag: u16, value: &str) {
        if !self.check_index(ifd_index) {
            return;
        }

        BasicTagsBuilder::add_ascii_tag(
            &mut self.ifds[ifd_index],
            &mut self.external_data,
            ifd_index,
            tag,
            value,
            self.is_big_tiff
        );
    }

    /// Write the TIFF file to disk
    pub fn write(&self, output_path: &Path) -> TiffResult<()> {
        if self.ifds.is_empty() {
            return Err(TiffError::GenericError("Refusing to write a TIFF without pages".to_string()));
        }

        self.logger.log(&format!("Writing TIFF with {} pages to {}", self.ifds.len(), output_path.display()))?;

        WriterBuilder::write(
            self.is_big_tiff,
            &self.ifds,
            &self.image_data,
            &self.external_data,
            output_path
        )
    }

    /// Write the TIFF into an in-memory or other seekable sink
    pub fn write_to(&self, writer: &mut (impl Write + Seek)) -> TiffResult<()> {
        WriterBuilder::write_to(
            writer,
            self.is_big_tiff,
            &self.ifds,
            &self.image_data,
            &self.external_data
        )
    }
}

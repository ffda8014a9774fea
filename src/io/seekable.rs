//! Seekable reader trait
//!
//! Tile stacks are read through a single trait object so the TIFF reader
//! works the same on files and in-memory cursors.

use std::io::{Read, Seek};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> SeekableReader for T {}

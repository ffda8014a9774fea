//! TIFF builder strategy modules
//!
//! Tag construction and file layout used by the TiffBuilder.

pub mod basic_tags;
pub mod writer;

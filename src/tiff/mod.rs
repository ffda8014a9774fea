//! TIFF file format module
//!
//! Reading of TIFF and BigTIFF tile stacks and writing of the ImageJ
//! hyperstacks produced by extraction.

pub mod errors;
pub mod ifd;
pub(crate) mod types;
pub mod header;
pub mod reader;
pub mod pages;
pub mod builder;
pub(crate) mod builders;
pub(crate) mod constants;
pub mod hyperstack;
#[cfg(test)]
mod tests;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use errors::{TiffError, TiffResult};
pub use ifd::{IFD, IFDEntry};
pub use reader::TiffReader;
pub use types::TIFF;
pub use builder::TiffBuilder;
pub use hyperstack::{read_hyperstack, write_hyperstack, HyperstackShape};

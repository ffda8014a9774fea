//! Compression handling for tile stack strips
//!
//! Strategies for decoding the strips of processed and cytometric stacks
//! and for encoding the strips of extracted hyperstacks.

mod handler;
mod uncompressed;
mod deflate;
mod factory;
mod zstd;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::AdobeDeflateHandler;
pub use factory::CompressionFactory;
pub use zstd::ZstdHandler;

//! Factory for creating compression handlers

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::deflate::AdobeDeflateHandler;
use super::zstd::ZstdHandler;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a handler for a Compression tag value read from a stack page
    pub fn create_handler(code: u64) -> TiffResult<Box<dyn CompressionHandler>> {
        match code as u16 {
            compression::NONE => Ok(Box::new(UncompressedHandler)),
            compression::DEFLATE => Ok(Box::new(AdobeDeflateHandler)),
            compression::ZSTD => Ok(Box::new(ZstdHandler::new())),
            _ => Err(TiffError::UnsupportedCompression(code))
        }
    }

    /// Get a handler by name, as given on the command line
    pub fn get_handler_by_name(name: &str) -> TiffResult<Box<dyn CompressionHandler>> {
        match name.to_lowercase().as_str() {
            "uncompressed" | "none" => Ok(Box::new(UncompressedHandler)),
            "deflate" | "zip" | "adobe deflate" => Ok(Box::new(AdobeDeflateHandler)),
            "zstd" => Ok(Box::new(ZstdHandler::new())),
            _ => Err(TiffError::GenericError(format!("Unknown compression type: {}", name)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handlers_round_trip_strip() {
        let strip: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        for name in ["none", "deflate", "zstd"] {
            let handler = CompressionFactory::get_handler_by_name(name).unwrap();
            let packed = handler.compress(&strip).unwrap();
            let by_code = CompressionFactory::create_handler(handler.code()).unwrap();
            assert_eq!(by_code.decompress(&packed).unwrap(), strip, "{}", name);
        }
    }

    #[test]
    fn test_unknown_compression_rejected() {
        assert!(matches!(
            CompressionFactory::create_handler(compression::LZW as u64),
            Err(TiffError::UnsupportedCompression(5))
        ));
        assert!(CompressionFactory::get_handler_by_name("jpeg").is_err());
    }
}

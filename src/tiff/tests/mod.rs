//! Tests for the TIFF reader and its building blocks

mod byte_order_tests;
mod reader_tests;

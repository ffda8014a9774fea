//! Tests for reading pages through the TIFF reader

use super::test_utils::{create_stripped_page_buffer, create_test_bigtiff_buffer, PAGE_SAMPLES};
use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::tags;
use crate::tiff::pages::PageReader;
use crate::tiff::reader::TiffReader;

#[test]
fn test_read_page_either_byte_order() {
    for (big_endian, expected_order) in [(false, ByteOrder::LittleEndian), (true, ByteOrder::BigEndian)] {
        let mut cursor = create_stripped_page_buffer(big_endian);
        let mut reader = TiffReader::new();
        let tiff = reader.read(&mut cursor).unwrap();

        assert_eq!(reader.byte_order().unwrap(), expected_order);
        assert!(!tiff.is_big_tiff);
        assert_eq!(tiff.ifd_count(), 1);

        let page = &tiff.ifds[0];
        assert_eq!(page.get_dimensions(), Some((3, 2)));
        assert_eq!(page.get_tag_value(tags::BITS_PER_SAMPLE), Some(16));

        let mut page_reader = PageReader::new(cursor, &reader);
        let layout = page_reader.layout(page).unwrap();
        assert_eq!((layout.width, layout.height, layout.bits_per_sample), (3, 2, 16));
        assert_eq!(page_reader.read_plane(page).unwrap(), PAGE_SAMPLES.to_vec());
    }
}

#[test]
fn test_read_bigtiff_dimensions() {
    let mut cursor = create_test_bigtiff_buffer();
    let mut reader = TiffReader::new();
    let tiff = reader.read(&mut cursor).unwrap();

    assert!(tiff.is_big_tiff);
    assert!(reader.is_big_tiff());
    assert_eq!(tiff.main_ifd().and_then(|ifd| ifd.get_dimensions()), Some((1344, 1008)));
}

#[test]
fn test_missing_ascii_tag_is_none() {
    let mut cursor = create_stripped_page_buffer(false);
    let mut reader = TiffReader::new();
    let tiff = reader.read(&mut cursor).unwrap();

    let description = reader.read_ascii_tag(&mut cursor, &tiff.ifds[0], tags::IMAGE_DESCRIPTION).unwrap();
    assert!(description.is_none());
}

#[test]
fn test_garbage_rejected() {
    let mut cursor = std::io::Cursor::new(b"PK\x03\x04 not a tiff".to_vec());
    let mut reader = TiffReader::new();
    assert!(reader.read(&mut cursor).is_err());
}

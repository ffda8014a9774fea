//! Tests for byte order detection and sample decoding

use std::io::Cursor;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};

#[test]
fn test_detects_marker_of_either_order() {
    for (marker, expected) in [([0x49u8, 0x49], ByteOrder::LittleEndian), ([0x4D, 0x4D], ByteOrder::BigEndian)] {
        let mut cursor = Cursor::new(marker.to_vec());
        assert_eq!(ByteOrder::detect(&mut cursor).unwrap(), expected);
        assert_eq!(cursor.position(), 2);
    }

    assert!(ByteOrder::detect(&mut Cursor::new(vec![0x49, 0x4D])).is_err());
    assert!(ByteOrder::detect(&mut Cursor::new(vec![0x49])).is_err());
}

#[test]
fn test_handlers_read_header_fields() {
    // Version, first IFD offset and a BigTIFF offset, as they follow the marker
    let mut little = Vec::new();
    little.write_u16::<LittleEndian>(42).unwrap();
    little.write_u32::<LittleEndian>(0x0001_0008).unwrap();
    little.write_u64::<LittleEndian>(0x1_0000_0010).unwrap();

    let mut big = Vec::new();
    big.write_u16::<BigEndian>(42).unwrap();
    big.write_u32::<BigEndian>(0x0001_0008).unwrap();
    big.write_u64::<BigEndian>(0x1_0000_0010).unwrap();

    let cases: [(Vec<u8>, &dyn ByteOrderHandler); 2] = [(little, &LittleEndianHandler), (big, &BigEndianHandler)];
    for (bytes, handler) in cases {
        let mut cursor = Cursor::new(bytes);
        assert_eq!(handler.read_u16(&mut cursor).unwrap(), 42);
        assert_eq!(handler.read_u32(&mut cursor).unwrap(), 0x0001_0008);
        assert_eq!(handler.read_u64(&mut cursor).unwrap(), 0x1_0000_0010);
        assert!(handler.read_u16(&mut cursor).is_err());
    }
}

#[test]
fn test_decode_u16_samples() {
    let bytes = [0x01, 0x02, 0xFF, 0x00, 0x07];
    assert_eq!(ByteOrder::LittleEndian.decode_u16_samples(&bytes), vec![0x0201, 0x00FF]);
    assert_eq!(ByteOrder::BigEndian.decode_u16_samples(&bytes), vec![0x0102, 0xFF00]);
}

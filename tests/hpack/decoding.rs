//! Tests for HPACK decoding

use hpack_context::{Config, Header, HpackDecoder, HpackError, Indexing};

#[test]
fn test_decode_indexed_header() {
    let mut decoder = HpackDecoder::new();

    // 0x82 = indexed header, index 2 = :method: GET
    let data = [0x82];
    let headers = decoder.decode(&data).unwrap();

    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].name, ":method");
    assert_eq!(headers[0].value, "GET");
}

#[test]
fn test_decode_multiple_indexed_headers() {
    let mut decoder = HpackDecoder::new();

    // 0x82 = :method: GET, 0x87 = :scheme: http, 0x86 = :path: /
    // (static indices shift as each hit is copied into the dynamic table)
    let data = [0x82, 0x87, 0x86];
    let headers = decoder.decode(&data).unwrap();

    assert_eq!(headers.len(), 3);
    assert_eq!(headers[0].name, ":method");
    assert_eq!(headers[0].value, "GET");
    assert_eq!(headers[1].name, ":scheme");
    assert_eq!(headers[1].value, "http");
    assert_eq!(headers[2].name, ":path");
    assert_eq!(headers[2].value, "/");
}

#[test]
fn test_decode_literal_with_indexing() {
    let mut decoder = HpackDecoder::new();

    // 0x40 = literal with indexing, new name
    let data = [
        0x40, // Literal with indexing, new name
        0x06, // Name length: 6
        b'c', b'u', b's', b't', b'o', b'm',
        0x05, // Value length: 5
        b'v', b'a', b'l', b'u', b'e',
    ];

    let headers = decoder.decode(&data).unwrap();

    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].name, "custom");
    assert_eq!(headers[0].value, "value");
}

#[test]
fn test_decode_literal_indexed_name() {
    let mut decoder = HpackDecoder::new();

    // 0x41 = literal with indexing, indexed name (index 1 = :authority)
    let data = [
        0x41, // Literal with indexing, name index 1
        0x0B, // Value length: 11
        b'e', b'x', b'a', b'm', b'p', b'l', b'e', b'.', b'c', b'o', b'm',
    ];

    let headers = decoder.decode(&data).unwrap();

    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].name, ":authority");
    assert_eq!(headers[0].value, "example.com");
}

#[test]
fn test_decode_huffman_literal() {
    let mut decoder = HpackDecoder::new();

    // :authority with Huffman-coded "www.example.com" (12 octets)
    let data = [
        0x41, 0x8c, 0xe7, 0xcf, 0x9b, 0xeb, 0xe8, 0x9b, 0x6f, 0xb1, 0x6f, 0xa9, 0xb6, 0xff,
    ];
    let headers = decoder.decode(&data).unwrap();
    assert_eq!(headers, vec![Header::new(":authority", "www.example.com")]);
}

#[test]
fn test_decode_literal_policies() {
    let mut decoder = HpackDecoder::new();

    let data = [
        0x00, 0x01, b'a', 0x01, b'1', // without indexing, new name
        0x10, 0x01, b'b', 0x01, b'2', // never indexed, new name
    ];
    let headers = decoder.decode(&data).unwrap();
    assert_eq!(
        headers,
        vec![Header::no_index("a", "1"), Header::never_index("b", "2")]
    );
    assert_eq!(headers[1].indexing, Indexing::NeverIndex);
    assert_eq!(decoder.context().table().dynamic_len(), 0);
}

#[test]
fn test_decode_empty_block_repeats_previous_list() {
    let mut decoder = HpackDecoder::new();
    let first = decoder.decode(&[0x82, 0x87]).unwrap();
    let second = decoder.decode(&[]).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_decode_toggle_off() {
    let mut decoder = HpackDecoder::new();
    decoder.decode(&[0x82, 0x87]).unwrap();

    // Dynamic 1 is :scheme http; referencing a carried entry removes it.
    let headers = decoder.decode(&[0x81]).unwrap();
    assert_eq!(headers, vec![Header::new(":method", "GET")]);
}

#[test]
fn test_decode_empty_reference_set() {
    let mut decoder = HpackDecoder::new();
    decoder.decode(&[0x82, 0x87]).unwrap();

    let headers = decoder.decode(&[0x30]).unwrap();
    assert!(headers.is_empty());
}

#[test]
fn test_decode_split_merged_values() {
    let mut decoder = HpackDecoder::new();
    let data = [0x41, 0x03, b'a', 0x00, b'b'];
    let headers = decoder.decode(&data).unwrap();
    assert_eq!(
        headers,
        vec![Header::new(":authority", "a"), Header::new(":authority", "b")]
    );
}

#[test]
fn test_decode_invalid_index() {
    let mut decoder = HpackDecoder::new();
    let err = decoder.decode(&[0xbf]).unwrap_err();
    assert_eq!(
        err,
        HpackError::InvalidIndex {
            offset: 0,
            index: 63,
            len: 61
        }
    );
}

#[test]
fn test_decode_index_zero() {
    let mut decoder = HpackDecoder::new();
    assert!(matches!(
        decoder.decode(&[0x80]),
        Err(HpackError::InvalidIndex { index: 0, .. })
    ));
}

#[test]
fn test_decode_truncated() {
    let mut decoder = HpackDecoder::new();
    let err = decoder.decode(&[0x82, 0x40, 0x05, b'a']).unwrap_err();
    assert!(matches!(err, HpackError::Truncated { offset: 1 }));
}

#[test]
fn test_decode_invalid_reset_octet() {
    let mut decoder = HpackDecoder::new();
    let err = decoder.decode(&[0x31]).unwrap_err();
    assert_eq!(err, HpackError::InvalidInstruction { offset: 0, octet: 0x31 });
}

#[test]
fn test_decode_size_update_above_ceiling() {
    let mut decoder = HpackDecoder::with_config(Config::new().with_max_table_size(256));

    // 0x2f 0xf2 0x01 = set max size 15 + 242 = 257, one above the ceiling
    let err = decoder.decode(&[0x2f, 0xf2, 0x01]).unwrap_err();
    assert!(matches!(
        err,
        HpackError::SizeUpdateTooLarge {
            offset: 0,
            ceiling: 256,
            ..
        }
    ));
}

#[test]
fn test_decode_size_update_evicts() {
    let mut decoder = HpackDecoder::new();
    decoder.decode(&[0x40, 0x01, b'a', 0x01, b'1']).unwrap();
    assert_eq!(decoder.context().table().dynamic_len(), 1);

    // Reset references first so the evicted entry is not carried.
    let headers = decoder.decode(&[0x30, 0x20]).unwrap();
    assert!(headers.is_empty());
    assert_eq!(decoder.context().table().dynamic_len(), 0);
    assert_eq!(decoder.context().table().max_size(), 0);
}

#[test]
fn test_decode_failure_is_permanent() {
    let mut decoder = HpackDecoder::new();
    assert!(decoder.decode(&[0xff, 0xff, 0xff]).is_err());
    assert!(decoder.context().is_poisoned());
    assert_eq!(decoder.decode(&[0x82]), Err(HpackError::Poisoned));
}

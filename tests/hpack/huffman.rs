//! Tests for the static Huffman code

use hpack_context::huffman;

#[test]
fn test_known_encodings() {
    let cases: &[(&[u8], &[u8])] = &[
        (b"www.example.com", &[0xe7, 0xcf, 0x9b, 0xeb, 0xe8, 0x9b, 0x6f, 0xb1, 0x6f, 0xa9, 0xb6, 0xff]),
        (b"no-cache", &[0xb9, 0xb9, 0x94, 0x95, 0x56, 0xbf]),
        (b"custom-key", &[0x57, 0x1c, 0x5c, 0xdb, 0x73, 0x7b, 0x2f, 0xaf]),
        (b"gzip", &[0xab, 0xdd, 0x97, 0xff]),
        (b"302", &[0x40, 0x17]),
    ];
    for &(plain, coded) in cases {
        assert_eq!(huffman::encode(plain), coded, "encoding {:?}", plain);
        assert_eq!(huffman::encoded_len(plain), coded.len());
        assert_eq!(huffman::decode(coded).unwrap(), plain);
    }
}

#[test]
fn test_eos_is_rejected() {
    let err = huffman::decode(&[0xff, 0xff, 0xee, 0x7f]).unwrap_err();
    assert_eq!(err.bit, 0);
}

#[test]
fn test_every_octet_survives() {
    let all: Vec<u8> = (0..=255).collect();
    assert_eq!(huffman::decode(&huffman::encode(&all)).unwrap(), all);
}

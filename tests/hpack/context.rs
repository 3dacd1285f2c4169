//! Tests for multi-block compression context behavior

use hpack_context::{Config, Context, Header, HeaderField, HpackError, Indexing};

fn request(path: &str) -> Vec<Header> {
    vec![
        Header::new(":method", "GET"),
        Header::new(":scheme", "http"),
        Header::new(":path", path),
        Header::new(":authority", "www.example.com"),
    ]
}

#[test]
fn test_second_identical_request_is_empty() {
    let mut encoder = Context::new();
    let mut decoder = Context::new();

    let first = encoder.compress(&request("/")).unwrap();
    assert_eq!(first.len(), 20);
    assert_eq!(decoder.decompress(&first).unwrap(), request("/"));

    let second = encoder.compress(&request("/")).unwrap();
    assert!(second.is_empty());
    assert_eq!(decoder.decompress(&second).unwrap(), request("/"));

    // And again: re-stamped entries keep their order.
    let third = encoder.compress(&request("/")).unwrap();
    assert!(third.is_empty());
    assert_eq!(decoder.decompress(&third).unwrap(), request("/"));
}

#[test]
fn test_changed_field_replaces_carried_entry() {
    let mut encoder = Context::new();
    let mut decoder = Context::new();
    decoder.decompress(&encoder.compress(&request("/")).unwrap()).unwrap();

    let block = encoder.compress(&request("/index.html")).unwrap();
    // Toggle off :path / (dynamic 2), then :path /index.html (static 5 + 4).
    assert_eq!(block, vec![0x82, 0x89]);

    // The new field comes first, then the carried entries oldest first.
    assert_eq!(
        decoder.decompress(&block).unwrap(),
        vec![
            Header::new(":path", "/index.html"),
            Header::new(":method", "GET"),
            Header::new(":scheme", "http"),
            Header::new(":authority", "www.example.com"),
        ]
    );
}

#[test]
fn test_eviction_of_retained_entries() {
    // Room for two small entries only.
    let config = Config::new().with_max_table_size(80);
    let mut encoder = Context::with_config(config.clone());
    let mut decoder = Context::with_config(config);

    let turns = [
        vec![Header::new("a", "1"), Header::new("b", "2")],
        vec![Header::new("a", "1"), Header::new("b", "2"), Header::new("c", "3")],
        vec![Header::new("c", "3"), Header::new("d", "4"), Header::new("e", "5")],
        vec![Header::new("a", "1")],
    ];
    for headers in turns {
        let block = encoder.compress(&headers).unwrap();
        let mut decoded = decoder.decompress(&block).unwrap();
        decoded.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(decoded, headers);
        assert!(decoder.table().size() <= 80);
    }
}

#[test]
fn test_decoder_emits_evicted_carried_entry() {
    let mut decoder = Context::with_config(Config::new().with_max_table_size(40));
    decoder.decompress(&[0x40, 0x01, b'a', 0x01, b'1']).unwrap();

    // Inserting "b" evicts the carried "a", which still belongs to the list.
    let headers = decoder
        .decompress(&[0x40, 0x01, b'b', 0x01, b'2'])
        .unwrap();
    assert_eq!(headers, vec![Header::new("a", "1"), Header::new("b", "2")]);
}

#[test]
fn test_policies_survive_roundtrip() {
    let mut encoder = Context::with_config(Config::new().with_default_no_index_names());
    let mut decoder = Context::new();
    let headers = vec![
        Header::new(":status", "302"),
        Header::new("location", "https://www.example.com"),
        Header::never_index("authorization", "Bearer token"),
        Header::no_index("x-trace", "7"),
    ];
    let decoded = decoder
        .decompress(&encoder.compress(&headers).unwrap())
        .unwrap();
    assert_eq!(decoded[0], Header::new(":status", "302"));
    assert_eq!(decoded[1].indexing, Indexing::NoIndex);
    assert_eq!(decoded[2], Header::never_index("authorization", "Bearer token"));
    assert_eq!(decoded[3], Header::no_index("x-trace", "7"));
    // Only :status was stored.
    assert_eq!(encoder.table().dynamic_len(), 1);
    assert_eq!(decoder.table().dynamic_len(), 1);
}

#[test]
fn test_merged_policy_is_strictest() {
    let mut encoder = Context::new();
    let mut decoder = Context::new();
    let headers = vec![
        Header::new("cookie", "a=1"),
        Header::never_index("cookie", "b=2"),
    ];
    let decoded = decoder
        .decompress(&encoder.compress(&headers).unwrap())
        .unwrap();
    assert_eq!(
        decoded,
        vec![
            Header::never_index("cookie", "a=1"),
            Header::never_index("cookie", "b=2"),
        ]
    );
}

#[test]
fn test_compress_fields_raw_octets() {
    let mut encoder = Context::new();
    let mut decoder = Context::new();
    let field = HeaderField::new(&b"x-bin"[..], &b"\xff\xfe"[..]);
    let block = encoder
        .compress_fields([(field.clone(), Indexing::Default)])
        .unwrap();
    let decoded = decoder.decompress_fields(&block).unwrap();
    assert_eq!(decoded, vec![(field, Indexing::Default)]);
}

#[test]
fn test_poisoned_decoder_rejects_everything() {
    let mut decoder = Context::new();
    let err = decoder.decompress(&[0x82, 0x40]).unwrap_err();
    assert_eq!(err, HpackError::Truncated { offset: 1 });
    assert_eq!(err.offset(), Some(1));
    assert!(decoder.is_poisoned());
    assert_eq!(decoder.decompress(&[]), Err(HpackError::Poisoned));
    assert_eq!(decoder.decompress_fields(&[0x82]), Err(HpackError::Poisoned));
}

#[test]
fn test_turn_counter() {
    let mut encoder = Context::new();
    assert_eq!(encoder.turn(), 0);
    encoder.compress(&request("/")).unwrap();
    encoder.compress(&[]).unwrap();
    assert_eq!(encoder.turn(), 2);
}

#[test]
fn test_empty_list_clears_references() {
    let mut encoder = Context::new();
    let mut decoder = Context::new();
    decoder.decompress(&encoder.compress(&request("/")).unwrap()).unwrap();

    let block = encoder.compress(&[]).unwrap();
    assert_eq!(block, vec![0x30]);
    assert!(decoder.decompress(&block).unwrap().is_empty());
}

#[test]
fn test_display_dump() {
    let mut ctx = Context::new();
    ctx.compress(&[Header::new("x-a", "1")]).unwrap();
    ctx.compress(&[Header::new("x-a", "1")]).unwrap();
    let dump = ctx.to_string();
    assert!(dump.contains("[  1] (s =   36) x-a: 1"));
    assert!(dump.contains("Table size: 36 / 4096"));
    assert!(dump.ends_with("Reference set:\n[  1] x-a: 1\n"));
}

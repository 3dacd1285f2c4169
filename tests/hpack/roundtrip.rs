//! Property tests: every header list sequence survives an encoder/decoder pair

use std::collections::HashSet;

use hpack_context::{huffman, Config, Context, Header, Indexing};
use proptest::prelude::*;

const NAMES: &[&str] = &[
    ":method",
    ":path",
    ":authority",
    "accept",
    "cookie",
    "set-cookie",
    "x-custom",
    "authorization",
];

const VALUES: &[&str] = &["", "GET", "/", "/index.html", "gzip", "a=1", "b=2", "www.example.com"];

fn indexing() -> impl Strategy<Value = Indexing> {
    prop_oneof![
        6 => Just(Indexing::Default),
        1 => Just(Indexing::NoIndex),
        1 => Just(Indexing::NeverIndex),
    ]
}

fn header() -> impl Strategy<Value = Header> {
    let name = prop_oneof![
        4 => proptest::sample::select(NAMES).prop_map(|s| s.to_string()),
        1 => "[a-z-]{1,12}",
    ];
    let value = prop_oneof![
        4 => proptest::sample::select(VALUES).prop_map(|s| s.to_string()),
        1 => "[ -~]{0,40}",
    ];
    (name, value, indexing()).prop_map(|(n, v, i)| Header::with_indexing(n, v, i))
}

/// Name/value pairs grouped by name; order within a name is kept.
fn canonical(headers: &[Header]) -> Vec<(String, String)> {
    let mut pairs: Vec<_> = headers
        .iter()
        .map(|h| (h.name.clone(), h.value.clone()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
}

proptest! {
    #[test]
    fn header_lists_roundtrip(
        turns in prop::collection::vec(prop::collection::vec(header(), 0..10), 1..8),
        table_size in prop_oneof![Just(0usize), 0usize..300, Just(4096usize)],
        use_huffman in any::<bool>(),
    ) {
        let config = Config::new()
            .with_huffman(use_huffman)
            .with_max_table_size(table_size)
            .with_default_no_index_names();
        let mut encoder = Context::with_config(config.clone());
        let mut decoder = Context::with_config(config);

        for headers in &turns {
            let block = encoder.compress(headers).unwrap();
            let decoded = decoder.decompress(&block).unwrap();
            prop_assert_eq!(canonical(&decoded), canonical(headers));
            prop_assert!(decoder.table().size() <= table_size);
            prop_assert_eq!(encoder.table().dynamic_len(), decoder.table().dynamic_len());
        }
    }

    #[test]
    fn repeated_list_keeps_exact_order(
        headers in prop::collection::vec(header(), 0..10),
        use_huffman in any::<bool>(),
    ) {
        // Distinct names, all indexable: everything fits and is carried over.
        let mut seen = HashSet::new();
        let headers: Vec<Header> = headers
            .into_iter()
            .filter(|h| seen.insert(h.name.clone()))
            .map(|h| Header::new(h.name, h.value))
            .collect();

        let config = Config::new().with_huffman(use_huffman);
        let mut encoder = Context::with_config(config.clone());
        let mut decoder = Context::with_config(config);

        let first = encoder.compress(&headers).unwrap();
        prop_assert_eq!(decoder.decompress(&first).unwrap(), headers.clone());

        let second = encoder.compress(&headers).unwrap();
        prop_assert!(second.is_empty());
        prop_assert_eq!(decoder.decompress(&second).unwrap(), headers);
    }

    #[test]
    fn resized_tables_stay_in_sync(
        turns in prop::collection::vec((prop::collection::vec(header(), 0..6), 0usize..200), 1..6),
    ) {
        let mut encoder = Context::new();
        let mut decoder = Context::new();

        for (headers, size) in &turns {
            let config = Config::new().with_max_table_size(*size);
            let block = encoder.compress_with(headers, &config).unwrap();
            let decoded = decoder.decompress(&block).unwrap();
            prop_assert_eq!(canonical(&decoded), canonical(headers));
            prop_assert_eq!(decoder.table().max_size(), *size);
        }
    }

    #[test]
    fn huffman_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let coded = huffman::encode(&data);
        prop_assert_eq!(coded.len(), huffman::encoded_len(&data));
        prop_assert_eq!(huffman::decode(&coded).unwrap(), data);
    }
}

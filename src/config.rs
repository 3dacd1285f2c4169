//! Context configuration.

use bytes::Bytes;

use crate::error::{HpackError, Result};
use crate::table::DEFAULT_MAX_TABLE_SIZE;

/// Names conventionally sent without indexing: their values rarely repeat.
pub const DEFAULT_NO_INDEX_NAMES: &[&str] = &["set-cookie", "content-length", "location", "etag", ":path"];

/// Conversion between header text and wire octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8. Invalid sequences are replaced when decoding.
    #[default]
    Utf8,
    /// ISO-8859-1: one octet per char, U+0000 to U+00FF only.
    Latin1,
}

impl TextEncoding {
    pub(crate) fn encode(self, text: &str) -> Result<Bytes> {
        match self {
            TextEncoding::Utf8 => Ok(Bytes::copy_from_slice(text.as_bytes())),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect::<Option<Vec<u8>>>()
                .map(Bytes::from)
                .ok_or_else(|| HpackError::Unrepresentable {
                    text: text.to_string(),
                }),
        }
    }

    pub(crate) fn decode(self, octets: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(octets).into_owned(),
            TextEncoding::Latin1 => octets.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

/// Settings for one direction of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Huffman-code literals when that makes them shorter.
    pub huffman: bool,
    pub text_encoding: TextEncoding,
    /// Dynamic table bound. When a context is built this is also the
    /// negotiated ceiling.
    pub max_table_size: usize,
    /// Names whose literals are never added to the dynamic table.
    pub no_index_names: Vec<Vec<u8>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            huffman: false,
            text_encoding: TextEncoding::Utf8,
            max_table_size: DEFAULT_MAX_TABLE_SIZE,
            no_index_names: Vec::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_huffman(mut self, huffman: bool) -> Self {
        self.huffman = huffman;
        self
    }

    pub fn with_text_encoding(mut self, encoding: TextEncoding) -> Self {
        self.text_encoding = encoding;
        self
    }

    pub fn with_max_table_size(mut self, size: usize) -> Self {
        self.max_table_size = size;
        self
    }

    pub fn with_no_index_names<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: AsRef<[u8]>,
    {
        self.no_index_names = names.into_iter().map(|n| n.as_ref().to_vec()).collect();
        self
    }

    /// Uses [`DEFAULT_NO_INDEX_NAMES`].
    pub fn with_default_no_index_names(self) -> Self {
        self.with_no_index_names(DEFAULT_NO_INDEX_NAMES)
    }

    pub(crate) fn is_no_index(&self, name: &[u8]) -> bool {
        self.no_index_names.iter().any(|n| n == name)
    }
}

//! Header list types and the per-direction encoder/decoder handles.
//!
//! [`HpackEncoder`] and [`HpackDecoder`] each own one [`Context`]. A
//! connection needs one of each; they must never share a context.

use crate::config::Config;
use crate::context::Context;
use crate::error::Result;

/// How a header may be stored in the peer's header table.
///
/// Ordered from least to most restrictive, so merging two policies is `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Indexing {
    /// Indexed and carried over whenever the table allows.
    #[default]
    Default,
    /// Sent as a literal that is not added to the table.
    NoIndex,
    /// Like `NoIndex`, and intermediaries must not index it either.
    NeverIndex,
}

/// A header name/value pair with its indexing policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Header {
    pub name: String,
    pub value: String,
    pub indexing: Indexing,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_indexing(name, value, Indexing::Default)
    }

    pub fn no_index(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_indexing(name, value, Indexing::NoIndex)
    }

    /// A header that must never be indexed, such as a credential.
    pub fn never_index(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_indexing(name, value, Indexing::NeverIndex)
    }

    pub fn with_indexing(
        name: impl Into<String>,
        value: impl Into<String>,
        indexing: Indexing,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            indexing,
        }
    }
}

/// HPACK decoder for header blocks received on one connection.
pub struct HpackDecoder {
    inner: Context,
}

impl std::fmt::Debug for HpackDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpackDecoder")
            .field("turn", &self.inner.turn())
            .field("poisoned", &self.inner.is_poisoned())
            .finish()
    }
}

impl Default for HpackDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackDecoder {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            inner: Context::with_config(config),
        }
    }

    /// Decode one complete header block into the header list it represents.
    ///
    /// The list includes headers carried over from the previous block.
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<Header>> {
        self.inner.decompress(data)
    }

    /// Applies a renegotiated SETTINGS_HEADER_TABLE_SIZE.
    pub fn set_table_size_ceiling(&mut self, ceiling: usize) {
        self.inner.set_table_size_ceiling(ceiling);
    }

    pub fn context(&self) -> &Context {
        &self.inner
    }
}

/// HPACK encoder for header blocks sent on one connection.
pub struct HpackEncoder {
    inner: Context,
}

impl std::fmt::Debug for HpackEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpackEncoder")
            .field("turn", &self.inner.turn())
            .finish()
    }
}

impl Default for HpackEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackEncoder {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            inner: Context::with_config(config),
        }
    }

    /// Encode a header list into an HPACK header block.
    pub fn encode(&mut self, headers: &[Header]) -> Result<Vec<u8>> {
        self.inner.compress(headers)
    }

    /// Encode with a one-off configuration. Only its table size persists.
    pub fn encode_with(&mut self, headers: &[Header], config: &Config) -> Result<Vec<u8>> {
        self.inner.compress_with(headers, config)
    }

    pub fn set_table_size_ceiling(&mut self, ceiling: usize) {
        self.inner.set_table_size_ceiling(ceiling);
    }

    pub fn context(&self) -> &Context {
        &self.inner
    }
}

// ============================================================================
// Tests
// ============================================================================

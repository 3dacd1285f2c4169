//! hpack-context: a stateful, sans-I/O HPACK header compression context
//!
//! This crate compresses and decompresses HTTP/2 header lists with the
//! draft HPACK scheme that carries a reference set between header blocks:
//! a header sent in one block is implied in the next unless it is removed.
//!
//! # Features
//!
//! - **Sans-I/O Design**: Header lists in, byte blocks out. No runtime, no sockets
//! - **Pure Rust**: No C bindings, compiles to WASM
//! - **Reference Carry-over**: Repeated header lists compress to an empty block
//! - **Huffman Coding**: Optional, applied per literal only when it saves space
//! - **Indexing Policies**: Per-header never-index and no-index control
//! - **Table Size Updates**: Bound changes are announced in-band
//!
//! # Quick Start
//!
//! ```rust
//! use hpack_context::{Header, HpackDecoder, HpackEncoder};
//!
//! let mut encoder = HpackEncoder::new();
//! let mut decoder = HpackDecoder::new();
//!
//! let request = vec![
//!     Header::new(":method", "GET"),
//!     Header::new(":path", "/"),
//!     Header::new(":authority", "www.example.com"),
//! ];
//!
//! let first = encoder.encode(&request).unwrap();
//! assert_eq!(decoder.decode(&first).unwrap(), request);
//!
//! // The same list again is carried over entirely.
//! let second = encoder.encode(&request).unwrap();
//! assert!(second.is_empty());
//! assert_eq!(decoder.decode(&second).unwrap().len(), 3);
//! ```
//!
//! # Architecture
//!
//! - [`huffman`]: the static Huffman code
//! - [`table`]: static and dynamic header tables
//! - [`reference`]: carry-over tracking between header lists
//! - [`block`]: instruction wire format
//! - [`context`]: one direction's compression state
//!
//! It does NOT provide:
//! - Framing (HEADERS/CONTINUATION assembly is the transport's job)
//! - SETTINGS negotiation (call `set_table_size_ceiling` with the result)
//! - Header validation beyond what the wire format requires

pub mod block;
pub mod config;
pub mod context;
pub mod error;
pub mod hpack;
pub mod huffman;
pub mod reference;
pub mod table;

pub use config::{Config, TextEncoding, DEFAULT_NO_INDEX_NAMES};
pub use context::Context;
pub use error::{HpackError, Result};
pub use hpack::{Header, HpackDecoder, HpackEncoder, Indexing};
pub use huffman::HuffmanError;
pub use table::{HeaderField, HeaderTable, TableMatch, DEFAULT_MAX_TABLE_SIZE};

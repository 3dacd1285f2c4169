//! Header table: the static table plus the evicting dynamic table.
//!
//! Both tables share one index space. Indices `1..=N` address the dynamic
//! table (newest entry first), `N+1..=N+61` address the static table, and
//! index 0 is never a table entry.

use std::collections::VecDeque;
use std::fmt;

use bytes::Bytes;

/// Default and maximum dynamic table size (SETTINGS_HEADER_TABLE_SIZE).
pub const DEFAULT_MAX_TABLE_SIZE: usize = 4096;

/// Per-entry bookkeeping overhead counted against the table size.
pub const ENTRY_OVERHEAD: usize = 32;

/// Number of entries in the static table.
pub const STATIC_TABLE_LEN: usize = 61;

/// A header name/value pair as carried on the wire.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HeaderField {
    pub name: Bytes,
    pub value: Bytes,
}

impl HeaderField {
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Size of this field for dynamic table accounting.
    pub fn size(&self) -> usize {
        self.name.len() + self.value.len() + ENTRY_OVERHEAD
    }
}

impl fmt::Debug for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HeaderField({:?}: {:?})",
            String::from_utf8_lossy(&self.name),
            String::from_utf8_lossy(&self.value)
        )
    }
}

// -- Static table --

/// Static table entries: (name, value). Indexed 1..61 when the dynamic table is empty.
static STATIC_TABLE: [(&[u8], &[u8]); STATIC_TABLE_LEN] = [
    (b":authority", b""),                  // 1
    (b":method", b"GET"),                  // 2
    (b":method", b"POST"),                 // 3
    (b":path", b"/"),                      // 4
    (b":path", b"/index.html"),            // 5
    (b":scheme", b"http"),                 // 6
    (b":scheme", b"https"),                // 7
    (b":status", b"200"),                  // 8
    (b":status", b"204"),                  // 9
    (b":status", b"206"),                  // 10
    (b":status", b"304"),                  // 11
    (b":status", b"400"),                  // 12
    (b":status", b"404"),                  // 13
    (b":status", b"500"),                  // 14
    (b"accept-charset", b""),              // 15
    (b"accept-encoding", b""),             // 16
    (b"accept-language", b""),             // 17
    (b"accept-ranges", b""),               // 18
    (b"accept", b""),                      // 19
    (b"access-control-allow-origin", b""), // 20
    (b"age", b""),                         // 21
    (b"allow", b""),                       // 22
    (b"authorization", b""),               // 23
    (b"cache-control", b""),               // 24
    (b"content-disposition", b""),         // 25
    (b"content-encoding", b""),            // 26
    (b"content-language", b""),            // 27
    (b"content-length", b""),              // 28
    (b"content-location", b""),            // 29
    (b"content-range", b""),               // 30
    (b"content-type", b""),                // 31
    (b"cookie", b""),                      // 32
    (b"date", b""),                        // 33
    (b"etag", b""),                        // 34
    (b"expect", b""),                      // 35
    (b"expires", b""),                     // 36
    (b"from", b""),                        // 37
    (b"host", b""),                        // 38
    (b"if-match", b""),                    // 39
    (b"if-modified-since", b""),           // 40
    (b"if-none-match", b""),               // 41
    (b"if-range", b""),                    // 42
    (b"if-unmodified-since", b""),         // 43
    (b"last-modified", b""),               // 44
    (b"link", b""),                        // 45
    (b"location", b""),                    // 46
    (b"max-forwards", b""),                // 47
    (b"proxy-authenticate", b""),          // 48
    (b"proxy-authorization", b""),         // 49
    (b"range", b""),                       // 50
    (b"referer", b""),                     // 51
    (b"refresh", b""),                     // 52
    (b"retry-after", b""),                 // 53
    (b"server", b""),                      // 54
    (b"set-cookie", b""),                  // 55
    (b"strict-transport-security", b""),   // 56
    (b"transfer-encoding", b""),           // 57
    (b"user-agent", b""),                  // 58
    (b"vary", b""),                        // 59
    (b"via", b""),                         // 60
    (b"www-authenticate", b""),            // 61
];

/// Returns the static entry at 1-based `index`.
pub fn static_entry(index: usize) -> Option<HeaderField> {
    let &(name, value) = STATIC_TABLE.get(index.checked_sub(1)?)?;
    Some(HeaderField::new(
        Bytes::from_static(name),
        Bytes::from_static(value),
    ))
}

// -- Lookup --

/// Result of searching the combined table for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMatch {
    /// Name and value match the entry at this index.
    Full(usize),
    /// Only the name matches; this is the first such index.
    Name(usize),
    /// Nothing matches.
    None,
}

impl TableMatch {
    /// Signed form: positive for a full match, negative for a name match, 0 for none.
    pub fn as_signed(self) -> isize {
        match self {
            TableMatch::Full(i) => i as isize,
            TableMatch::Name(i) => -(i as isize),
            TableMatch::None => 0,
        }
    }
}

// -- Dynamic table --

/// A dynamic table entry and its reference watermark.
///
/// `mark` is the turn in which the entry was last referenced; see
/// [`ReferenceTracker`](crate::reference::ReferenceTracker).
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) field: HeaderField,
    pub(crate) mark: Option<u64>,
}

/// The combined static + dynamic header table.
///
/// Dynamic entries are stored newest-first: `entries[0]` is index 1.
#[derive(Debug, Clone)]
pub struct HeaderTable {
    entries: VecDeque<Entry>,
    size: usize,
    max_size: usize,
    ceiling: usize,
}

impl Default for HeaderTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderTable {
    pub fn new() -> Self {
        Self::with_ceiling(DEFAULT_MAX_TABLE_SIZE)
    }

    /// Creates an empty table whose bound and negotiated ceiling are both `ceiling`.
    pub fn with_ceiling(ceiling: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            size: 0,
            max_size: ceiling,
            ceiling,
        }
    }

    /// Number of addressable entries (dynamic + static).
    pub fn len(&self) -> usize {
        self.entries.len() + STATIC_TABLE_LEN
    }

    /// A header table always holds the static entries.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn dynamic_len(&self) -> usize {
        self.entries.len()
    }

    /// Current accounted size of the dynamic table.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// True if `index` falls in the static part of the index space.
    pub fn is_static(&self, index: usize) -> bool {
        index > self.entries.len()
    }

    /// Searches dynamic entries (newest first), then the static table.
    ///
    /// A full match anywhere wins over a name match; among name matches the
    /// dynamic table is preferred.
    pub fn lookup(&self, name: &[u8], value: &[u8]) -> TableMatch {
        let mut name_match = None;

        for (i, entry) in self.entries.iter().enumerate() {
            if entry.field.name == name {
                if entry.field.value == value {
                    return TableMatch::Full(i + 1);
                }
                name_match.get_or_insert(i + 1);
            }
        }

        let offset = self.entries.len();
        for (i, (n, v)) in STATIC_TABLE.iter().enumerate() {
            if *n == name {
                if *v == value {
                    return TableMatch::Full(offset + i + 1);
                }
                name_match.get_or_insert(offset + i + 1);
            }
        }

        name_match.map_or(TableMatch::None, TableMatch::Name)
    }

    /// Resolves a 1-based combined index.
    pub fn get(&self, index: usize) -> Option<HeaderField> {
        let slot = index.checked_sub(1)?;
        match self.entries.get(slot) {
            Some(entry) => Some(entry.field.clone()),
            None => static_entry(slot - self.entries.len() + 1),
        }
    }

    /// Inserts `field` as index 1, evicting from the tail to make room.
    ///
    /// Returns false if the field is larger than the whole table; the table is
    /// then left empty and the field is not stored.
    pub fn add(&mut self, field: HeaderField) -> bool {
        self.insert(field, &mut Vec::new())
    }

    /// Changes the table bound, clamped to the ceiling, evicting as needed.
    ///
    /// Returns the bound actually applied.
    pub fn set_max_size(&mut self, size: usize) -> usize {
        self.resize(size, &mut Vec::new())
    }

    /// Records a renegotiated ceiling.
    ///
    /// The current bound is left alone: the peer learns of a smaller table
    /// only through a size update, which the encoder emits on its next block.
    pub fn set_ceiling(&mut self, ceiling: usize) {
        self.ceiling = ceiling;
    }

    pub(crate) fn insert(&mut self, field: HeaderField, evicted: &mut Vec<Entry>) -> bool {
        let entry_size = field.size();
        while self.size + entry_size > self.max_size {
            match self.evict() {
                Some(entry) => evicted.push(entry),
                None => break,
            }
        }
        if entry_size > self.max_size {
            return false;
        }
        self.size += entry_size;
        self.entries.push_front(Entry { field, mark: None });
        true
    }

    pub(crate) fn resize(&mut self, size: usize, evicted: &mut Vec<Entry>) -> usize {
        self.max_size = size.min(self.ceiling);
        while self.size > self.max_size {
            match self.evict() {
                Some(entry) => evicted.push(entry),
                None => break,
            }
        }
        self.max_size
    }

    fn evict(&mut self) -> Option<Entry> {
        let entry = self.entries.pop_back()?;
        self.size -= entry.field.size();
        Some(entry)
    }

    pub(crate) fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index.checked_sub(1)?)
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> Option<&mut Entry> {
        self.entries.get_mut(index.checked_sub(1)?)
    }

    /// Dynamic entries, newest first.
    pub(crate) fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub(crate) fn entries_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Entry> {
        self.entries.iter_mut()
    }
}

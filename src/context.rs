//! Compression context: one direction of one connection.
//!
//! A context owns a header table and a reference tracker. The encoder and
//! decoder for a connection are separate contexts that stay in lockstep only
//! by processing the same instruction stream, so both sides route every
//! table and reference update through [`Context::apply`].

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::block::{BlockDecoder, BlockEncoder, Instruction, Name, Representation};
use crate::config::Config;
use crate::error::{HpackError, Result};
use crate::hpack::{Header, Indexing};
use crate::reference::ReferenceTracker;
use crate::table::{HeaderField, HeaderTable, TableMatch};

/// Separator placed between values of fields that share a name.
const DELIMITER: u8 = 0;

/// A normalized field waiting to be encoded in the current turn.
#[derive(Debug)]
struct Pending {
    field: HeaderField,
    indexing: Indexing,
    done: bool,
}

#[derive(Debug)]
pub struct Context {
    config: Config,
    table: HeaderTable,
    refs: ReferenceTracker,
    poisoned: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a context whose negotiated table ceiling is `config.max_table_size`.
    pub fn with_config(config: Config) -> Self {
        Self {
            table: HeaderTable::with_ceiling(config.max_table_size),
            refs: ReferenceTracker::new(),
            poisoned: false,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn table(&self) -> &HeaderTable {
        &self.table
    }

    /// Number of completed compress or decompress calls.
    pub fn turn(&self) -> u64 {
        self.refs.turn()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Records a table size ceiling renegotiated by the transport.
    ///
    /// On an encoder the configured bound is clamped to it and announced with
    /// the next header block. On a decoder it bounds later size updates.
    pub fn set_table_size_ceiling(&mut self, ceiling: usize) {
        self.table.set_ceiling(ceiling);
        self.config.max_table_size = self.config.max_table_size.min(ceiling);
    }

    // -- Compression --

    /// Compresses one header list using the context's configuration.
    pub fn compress(&mut self, headers: &[Header]) -> Result<Vec<u8>> {
        let fields = headers
            .iter()
            .map(|h| {
                let name = self.config.text_encoding.encode(&h.name)?;
                let value = self.config.text_encoding.encode(&h.value)?;
                Ok((HeaderField { name, value }, h.indexing))
            })
            .collect::<Result<Vec<_>>>()?;
        self.compress_fields(fields)
    }

    /// Compresses `headers` with a one-off configuration.
    ///
    /// Only `max_table_size` outlives the call: a changed bound is sent to the
    /// peer as a size update and stays in effect.
    pub fn compress_with(&mut self, headers: &[Header], config: &Config) -> Result<Vec<u8>> {
        let max_table_size = config.max_table_size.min(self.table.ceiling());
        let saved = std::mem::replace(
            &mut self.config,
            Config {
                max_table_size,
                ..config.clone()
            },
        );
        let result = self.compress(headers);
        self.config = Config {
            max_table_size,
            ..saved
        };
        result
    }

    /// Compresses one header list given as wire octets.
    pub fn compress_fields<I>(&mut self, fields: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = (HeaderField, Indexing)>,
    {
        if self.poisoned {
            return Err(HpackError::Poisoned);
        }
        let mut pending = normalize(fields);
        let huffman = self.config.huffman;
        let mut block = BlockEncoder::new();

        let target = self.config.max_table_size.min(self.table.ceiling());
        if target != self.table.max_size() {
            debug!(from = self.table.max_size(), to = target, "announcing table size update");
            self.emit(&mut block, Instruction::EmptyReferenceSet, huffman)?;
            self.emit(&mut block, Instruction::SetMaxSize(target), huffman)?;
        }

        // Re-mark carried-over matches before any insertion can evict them.
        let mut retained = 0usize;
        for p in pending.iter_mut().filter(|p| p.indexing == Indexing::Default) {
            if let Some(index) = self.find_carried(&p.field) {
                self.refs.mark(&mut self.table, index);
                p.done = true;
                retained += 1;
            }
        }

        let stale = self.refs.carried_over(&self.table);
        if retained == 0 && stale.len() > 1 {
            self.emit(&mut block, Instruction::EmptyReferenceSet, huffman)?;
        } else {
            for index in stale {
                self.emit(&mut block, Instruction::Indexed(index), huffman)?;
            }
        }

        for p in pending.iter().filter(|p| !p.done) {
            let instruction = self.choose(p);
            self.emit(&mut block, instruction, huffman)?;
        }

        let turn = self.refs.turn();
        self.refs.finish_turn(&mut self.table, &mut Vec::new());
        debug!(
            turn,
            fields = pending.len(),
            retained,
            bytes = block.len(),
            table_size = self.table.size(),
            "compressed header list"
        );
        Ok(block.finish())
    }

    fn find_carried(&self, field: &HeaderField) -> Option<usize> {
        (1..=self.table.dynamic_len()).find(|&index| {
            self.refs.is_carried_over(&self.table, index)
                && self.table.get(index).as_ref() == Some(field)
        })
    }

    fn choose(&self, pending: &Pending) -> Instruction {
        let field = &pending.field;
        let found = self.table.lookup(&field.name, &field.value);
        if let (Indexing::Default, TableMatch::Full(index)) = (pending.indexing, found) {
            return Instruction::Indexed(index);
        }

        let representation = match pending.indexing {
            Indexing::NeverIndex => Representation::LiteralNeverIndexed,
            Indexing::NoIndex => Representation::LiteralWithoutIndexing,
            Indexing::Default if self.config.is_no_index(&field.name) => {
                Representation::LiteralWithoutIndexing
            }
            Indexing::Default => Representation::LiteralWithIndexing,
        };
        let name = match found {
            TableMatch::Full(index) | TableMatch::Name(index) => Name::Indexed(index),
            TableMatch::None => Name::Literal(field.name.clone()),
        };
        Instruction::Literal {
            representation,
            name,
            value: field.value.clone(),
        }
    }

    fn emit(&mut self, block: &mut BlockEncoder, instruction: Instruction, huffman: bool) -> Result<()> {
        let offset = block.len();
        block.encode(&instruction, huffman);
        self.apply(&instruction, offset, &mut Vec::new())
    }

    // -- Decompression --

    /// Decompresses one complete header block.
    ///
    /// Any failure poisons the context: later calls return
    /// [`HpackError::Poisoned`].
    pub fn decompress(&mut self, block: &[u8]) -> Result<Vec<Header>> {
        let encoding = self.config.text_encoding;
        Ok(self
            .decompress_fields(block)?
            .into_iter()
            .map(|(field, indexing)| Header {
                name: encoding.decode(&field.name),
                value: encoding.decode(&field.value),
                indexing,
            })
            .collect())
    }

    /// Decompresses one complete header block into wire octets.
    pub fn decompress_fields(&mut self, block: &[u8]) -> Result<Vec<(HeaderField, Indexing)>> {
        if self.poisoned {
            return Err(HpackError::Poisoned);
        }
        match self.decode_block(block) {
            Ok(fields) => Ok(denormalize(fields)),
            Err(err) => {
                warn!(%err, turn = self.refs.turn(), "header block decode failed, context unusable");
                self.poisoned = true;
                Err(err)
            }
        }
    }

    fn decode_block(&mut self, block: &[u8]) -> Result<Vec<(HeaderField, Indexing)>> {
        let mut decoder = BlockDecoder::new(block);
        let mut out = Vec::new();
        while let Some(instruction) = decoder.next_instruction()? {
            self.apply(&instruction, decoder.instruction_offset(), &mut out)?;
        }

        let turn = self.refs.turn();
        let mut carried = Vec::new();
        self.refs.finish_turn(&mut self.table, &mut carried);
        debug!(
            turn,
            fields = out.len() + carried.len(),
            carried = carried.len(),
            bytes = block.len(),
            "decompressed header block"
        );
        out.extend(carried.into_iter().map(|f| (f, Indexing::Default)));
        Ok(out)
    }

    // -- Shared state machine --

    fn resolve(&self, index: usize, offset: usize) -> Result<HeaderField> {
        self.table.get(index).ok_or(HpackError::InvalidIndex {
            offset,
            index,
            len: self.table.len(),
        })
    }

    /// Applies one instruction to the table and reference state, appending
    /// the fields it contributes to the header list to `out`.
    fn apply(
        &mut self,
        instruction: &Instruction,
        offset: usize,
        out: &mut Vec<(HeaderField, Indexing)>,
    ) -> Result<()> {
        let mut released = Vec::new();
        match instruction {
            Instruction::Indexed(index) => {
                let index = *index;
                let field = self.resolve(index, offset)?;
                if self.refs.is_carried_over(&self.table, index) {
                    self.refs.unmark(&mut self.table, index);
                } else {
                    if self.table.is_static(index) {
                        self.refs.insert(&mut self.table, field.clone(), &mut released);
                    } else {
                        self.refs.mark(&mut self.table, index);
                    }
                    out.extend(released.drain(..).map(|f| (f, Indexing::Default)));
                    out.push((field, Indexing::Default));
                }
            }
            Instruction::Literal {
                representation,
                name,
                value,
            } => {
                let name = match name {
                    Name::Indexed(index) => self.resolve(*index, offset)?.name,
                    Name::Literal(name) => name.clone(),
                };
                let field = HeaderField {
                    name,
                    value: value.clone(),
                };
                let indexing = match representation {
                    Representation::LiteralWithIndexing => {
                        self.refs.insert(&mut self.table, field.clone(), &mut released);
                        Indexing::Default
                    }
                    Representation::LiteralWithoutIndexing => Indexing::NoIndex,
                    Representation::LiteralNeverIndexed => Indexing::NeverIndex,
                    other => {
                        return Err(HpackError::InvalidInstruction {
                            offset,
                            octet: other.flag(),
                        })
                    }
                };
                out.extend(released.drain(..).map(|f| (f, Indexing::Default)));
                out.push((field, indexing));
            }
            Instruction::EmptyReferenceSet => self.refs.reset_all(&mut self.table),
            Instruction::SetMaxSize(size) => {
                let ceiling = self.table.ceiling();
                if *size > ceiling {
                    return Err(HpackError::SizeUpdateTooLarge {
                        offset,
                        requested: *size,
                        ceiling,
                    });
                }
                self.refs.set_max_size(&mut self.table, *size, &mut released);
                debug!(size, evicted_referenced = released.len(), "table size updated");
                out.extend(released.drain(..).map(|f| (f, Indexing::Default)));
            }
        }
        Ok(())
    }
}

/// Merges fields sharing a name into one field with NUL-joined values.
///
/// The merged field keeps the position of the first occurrence and the
/// strictest indexing policy of its parts.
fn normalize<I>(fields: I) -> Vec<Pending>
where
    I: IntoIterator<Item = (HeaderField, Indexing)>,
{
    let mut merged: Vec<(Bytes, Vec<u8>, Indexing)> = Vec::new();
    let mut by_name: HashMap<Bytes, usize> = HashMap::new();

    for (field, indexing) in fields {
        match by_name.get(&field.name) {
            Some(&i) => {
                let (_, value, policy) = &mut merged[i];
                value.push(DELIMITER);
                value.extend_from_slice(&field.value);
                *policy = (*policy).max(indexing);
            }
            None => {
                by_name.insert(field.name.clone(), merged.len());
                merged.push((field.name, field.value.to_vec(), indexing));
            }
        }
    }

    merged
        .into_iter()
        .map(|(name, value, indexing)| Pending {
            field: HeaderField::new(name, value),
            indexing,
            done: false,
        })
        .collect()
}

/// Splits NUL-joined values back into one field per value.
fn denormalize(fields: Vec<(HeaderField, Indexing)>) -> Vec<(HeaderField, Indexing)> {
    let mut out = Vec::with_capacity(fields.len());
    for (field, indexing) in fields {
        if !field.value.contains(&DELIMITER) {
            out.push((field, indexing));
            continue;
        }
        for part in field.value.split(|&b| b == DELIMITER) {
            let value = field.value.slice_ref(part);
            out.push((HeaderField::new(field.name.clone(), value), indexing));
        }
    }
    out
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Header table:")?;
        for index in 1..=self.table.dynamic_len() {
            if let Some(field) = self.table.get(index) {
                writeln!(
                    f,
                    "[{index:>3}] (s = {:>4}) {}: {}",
                    field.size(),
                    String::from_utf8_lossy(&field.name),
                    String::from_utf8_lossy(&field.value)
                )?;
            }
        }
        writeln!(
            f,
            "      Table size: {} / {}",
            self.table.size(),
            self.table.max_size()
        )?;
        writeln!(f, "Reference set:")?;
        for index in self.refs.carried_over(&self.table) {
            if let Some(field) = self.table.get(index) {
                writeln!(
                    f,
                    "[{index:>3}] {}: {}",
                    String::from_utf8_lossy(&field.name),
                    String::from_utf8_lossy(&field.value)
                )?;
            }
        }
        Ok(())
    }
}

//! Header block codec: prefixed integers, literals and instructions.
//!
//! Each instruction starts with an octet whose high bits select the
//! representation and whose low bits hold the start of a prefixed integer:
//!
//! ```text
//! 1xxxxxxx  Indexed                       (7-bit prefix)
//! 01xxxxxx  Literal with incremental indexing (6-bit prefix)
//! 0000xxxx  Literal without indexing      (4-bit prefix)
//! 0001xxxx  Literal never indexed         (4-bit prefix)
//! 0010xxxx  Set max table size            (4-bit prefix)
//! 00110000  Empty reference set
//! ```

use bytes::{BufMut, Bytes};
use tracing::trace;

use crate::error::{HpackError, Result};
use crate::huffman;

/// Instruction class selected by the leading octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Indexed,
    LiteralWithIndexing,
    LiteralWithoutIndexing,
    LiteralNeverIndexed,
    EmptyReferenceSet,
    SetMaxSize,
}

impl Representation {
    /// High-bit pattern of the leading octet.
    pub const fn flag(self) -> u8 {
        match self {
            Representation::Indexed => 0x80,
            Representation::LiteralWithIndexing => 0x40,
            Representation::LiteralWithoutIndexing => 0x00,
            Representation::LiteralNeverIndexed => 0x10,
            Representation::EmptyReferenceSet => 0x30,
            Representation::SetMaxSize => 0x20,
        }
    }

    /// Prefix mask of the integer sharing the leading octet.
    pub const fn mask(self) -> u8 {
        match self {
            Representation::Indexed => 0x7f,
            Representation::LiteralWithIndexing => 0x3f,
            Representation::LiteralWithoutIndexing
            | Representation::LiteralNeverIndexed
            | Representation::EmptyReferenceSet
            | Representation::SetMaxSize => 0x0f,
        }
    }

    pub fn classify(octet: u8) -> Option<Self> {
        if octet & 0x80 != 0 {
            return Some(Representation::Indexed);
        }
        if octet & 0x40 != 0 {
            return Some(Representation::LiteralWithIndexing);
        }
        match octet & 0xf0 {
            0x00 => Some(Representation::LiteralWithoutIndexing),
            0x10 => Some(Representation::LiteralNeverIndexed),
            0x20 => Some(Representation::SetMaxSize),
            0x30 if octet == 0x30 => Some(Representation::EmptyReferenceSet),
            _ => None,
        }
    }
}

/// How a literal names its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Name {
    /// Name taken from the table entry at this index.
    Indexed(usize),
    Literal(Bytes),
}

/// One decoded or to-be-encoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Indexed(usize),
    Literal {
        representation: Representation,
        name: Name,
        value: Bytes,
    },
    EmptyReferenceSet,
    SetMaxSize(usize),
}

// -- Encoding --

/// Accumulates the binary form of a header block.
#[derive(Debug, Default)]
pub struct BlockEncoder {
    buf: Vec<u8>,
}

impl BlockEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes `value` with the given prefix mask, OR-ing `flag` into the first octet.
    pub fn encode_integer(&mut self, value: usize, mask: u8, flag: u8) {
        let max = usize::from(mask);
        if value < max {
            self.buf.put_u8(flag | value as u8);
            return;
        }
        self.buf.put_u8(flag | mask);
        let mut rest = value - max;
        while rest >= 0x80 {
            self.buf.put_u8(0x80 | (rest & 0x7f) as u8);
            rest >>= 7;
        }
        self.buf.put_u8(rest as u8);
    }

    /// Writes a length-prefixed literal. With `huffman` set, the Huffman form
    /// is used when it is strictly shorter than the raw octets.
    pub fn encode_literal(&mut self, literal: &[u8], huffman: bool) {
        if huffman && huffman::encoded_len(literal) < literal.len() {
            let coded = huffman::encode(literal);
            self.encode_integer(coded.len(), 0x7f, 0x80);
            self.buf.put_slice(&coded);
        } else {
            self.encode_integer(literal.len(), 0x7f, 0x00);
            self.buf.put_slice(literal);
        }
    }

    pub fn encode(&mut self, instruction: &Instruction, huffman: bool) {
        trace!(offset = self.buf.len(), ?instruction, "encoding instruction");
        match instruction {
            Instruction::Indexed(index) => {
                let r = Representation::Indexed;
                self.encode_integer(*index, r.mask(), r.flag());
            }
            Instruction::Literal {
                representation,
                name,
                value,
            } => {
                let (mask, flag) = (representation.mask(), representation.flag());
                match name {
                    Name::Indexed(index) => self.encode_integer(*index, mask, flag),
                    Name::Literal(name) => {
                        self.encode_integer(0, mask, flag);
                        self.encode_literal(name, huffman);
                    }
                }
                self.encode_literal(value, huffman);
            }
            Instruction::EmptyReferenceSet => {
                let r = Representation::EmptyReferenceSet;
                self.encode_integer(0, r.mask(), r.flag());
            }
            Instruction::SetMaxSize(size) => {
                let r = Representation::SetMaxSize;
                self.encode_integer(*size, r.mask(), r.flag());
            }
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

// -- Decoding --

/// Reads instructions from one complete header block.
#[derive(Debug)]
pub struct BlockDecoder<'a> {
    buf: &'a [u8],
    offset: usize,
    start: usize,
}

impl<'a> BlockDecoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            start: 0,
        }
    }

    /// Offset of the instruction currently being read.
    pub fn instruction_offset(&self) -> usize {
        self.start
    }

    fn truncated(&self) -> HpackError {
        HpackError::Truncated { offset: self.start }
    }

    fn read_octet(&mut self) -> Result<u8> {
        let octet = *self.buf.get(self.offset).ok_or_else(|| self.truncated())?;
        self.offset += 1;
        Ok(octet)
    }

    pub fn decode_integer(&mut self, mask: u8) -> Result<usize> {
        let value = self.read_octet()? & mask;
        if value < mask {
            return Ok(usize::from(value));
        }

        let mut value = u64::from(mask);
        let mut shift = 0u32;
        loop {
            let octet = self.read_octet()?;
            if shift > 56 {
                return Err(HpackError::IntegerOverflow { offset: self.start });
            }
            value += u64::from(octet & 0x7f) << shift;
            shift += 7;
            if octet & 0x80 == 0 {
                break;
            }
        }
        usize::try_from(value).map_err(|_| HpackError::IntegerOverflow { offset: self.start })
    }

    pub fn decode_literal(&mut self) -> Result<Bytes> {
        let huffman = self.buf.get(self.offset).is_some_and(|b| b & 0x80 != 0);
        let len = self.decode_integer(0x7f)?;
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| self.truncated())?;
        let raw = &self.buf[self.offset..end];
        self.offset = end;

        if huffman {
            huffman::decode(raw)
                .map(Bytes::from)
                .map_err(|source| HpackError::Huffman {
                    offset: self.start,
                    source,
                })
        } else {
            Ok(Bytes::copy_from_slice(raw))
        }
    }

    /// Reads the next instruction, or `None` at the end of the block.
    pub fn next_instruction(&mut self) -> Result<Option<Instruction>> {
        let Some(&octet) = self.buf.get(self.offset) else {
            return Ok(None);
        };
        self.start = self.offset;
        let representation = Representation::classify(octet).ok_or(HpackError::InvalidInstruction {
            offset: self.start,
            octet,
        })?;

        let instruction = match representation {
            Representation::Indexed => Instruction::Indexed(self.decode_integer(representation.mask())?),
            Representation::EmptyReferenceSet => {
                self.offset += 1;
                Instruction::EmptyReferenceSet
            }
            Representation::SetMaxSize => Instruction::SetMaxSize(self.decode_integer(representation.mask())?),
            Representation::LiteralWithIndexing
            | Representation::LiteralWithoutIndexing
            | Representation::LiteralNeverIndexed => {
                let index = self.decode_integer(representation.mask())?;
                let name = if index == 0 {
                    Name::Literal(self.decode_literal()?)
                } else {
                    Name::Indexed(index)
                };
                let value = self.decode_literal()?;
                Instruction::Literal {
                    representation,
                    name,
                    value,
                }
            }
        };

        trace!(offset = self.start, ?instruction, "decoded instruction");
        Ok(Some(instruction))
    }
}

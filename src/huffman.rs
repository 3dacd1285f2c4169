//! Static Huffman coder for HPACK literals.
//!
//! The code covers the 256 octet values plus an end-of-string symbol. Codes are
//! packed most-significant-bit first and the final octet is padded with the
//! high-order bits of EOS (all ones).

use std::sync::OnceLock;

use thiserror::Error;

/// Symbol index of the end-of-string code.
const EOS: usize = 256;

/// A Huffman string that cannot be decoded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid Huffman code at bit {bit}")]
pub struct HuffmanError {
    /// Bit offset (from the start of the literal) where the bad code begins.
    pub bit: usize,
}

/// `(code, bit length)` per symbol: octets 0-255, then EOS.
static HUFFMAN_TABLE: [(u32, u8); 257] = [
    (0x3ffffba, 26),
    (0x3ffffbb, 26),
    (0x3ffffbc, 26),
    (0x3ffffbd, 26),
    (0x3ffffbe, 26),
    (0x3ffffbf, 26),
    (0x3ffffc0, 26),
    (0x3ffffc1, 26),
    (0x3ffffc2, 26),
    (0x3ffffc3, 26),
    (0x3ffffc4, 26),
    (0x3ffffc5, 26),
    (0x3ffffc6, 26),
    (0x3ffffc7, 26),
    (0x3ffffc8, 26),
    (0x3ffffc9, 26),
    (0x3ffffca, 26),
    (0x3ffffcb, 26),
    (0x3ffffcc, 26),
    (0x3ffffcd, 26),
    (0x3ffffce, 26),
    (0x3ffffcf, 26),
    (0x3ffffd0, 26),
    (0x3ffffd1, 26),
    (0x3ffffd2, 26),
    (0x3ffffd3, 26),
    (0x3ffffd4, 26),
    (0x3ffffd5, 26),
    (0x3ffffd6, 26),
    (0x3ffffd7, 26),
    (0x3ffffd8, 26),
    (0x3ffffd9, 26),
    (0x6, 5), // ' '
    (0x1ffc, 13), // '!'
    (0x1f0, 9), // '"'
    (0x3ffc, 14), // '#'
    (0x7ffc, 15), // '$'
    (0x1e, 6), // '%'
    (0x64, 7), // '&'
    (0x1ffd, 13), // '\''
    (0x3fa, 10), // '('
    (0x1f1, 9), // ')'
    (0x3fb, 10), // '*'
    (0x3fc, 10), // '+'
    (0x65, 7), // ','
    (0x66, 7), // '-'
    (0x1f, 6), // '.'
    (0x7, 5), // '/'
    (0x0, 4), // '0'
    (0x1, 4), // '1'
    (0x2, 4), // '2'
    (0x8, 5), // '3'
    (0x20, 6), // '4'
    (0x21, 6), // '5'
    (0x22, 6), // '6'
    (0x23, 6), // '7'
    (0x24, 6), // '8'
    (0x25, 6), // '9'
    (0x26, 6), // ':'
    (0xec, 8), // ';'
    (0x1fffc, 17), // '<'
    (0x27, 6), // '='
    (0x7ffd, 15), // '>'
    (0x3fd, 10), // '?'
    (0x7ffe, 15), // '@'
    (0x67, 7), // 'A'
    (0xed, 8), // 'B'
    (0xee, 8), // 'C'
    (0x68, 7), // 'D'
    (0xef, 8), // 'E'
    (0x69, 7), // 'F'
    (0x6a, 7), // 'G'
    (0x1f2, 9), // 'H'
    (0xf0, 8), // 'I'
    (0x1f3, 9), // 'J'
    (0x1f4, 9), // 'K'
    (0x1f5, 9), // 'L'
    (0x6b, 7), // 'M'
    (0x6c, 7), // 'N'
    (0xf1, 8), // 'O'
    (0xf2, 8), // 'P'
    (0x1f6, 9), // 'Q'
    (0x1f7, 9), // 'R'
    (0x6d, 7), // 'S'
    (0x28, 6), // 'T'
    (0xf3, 8), // 'U'
    (0x1f8, 9), // 'V'
    (0x1f9, 9), // 'W'
    (0xf4, 8), // 'X'
    (0x1fa, 9), // 'Y'
    (0x1fb, 9), // 'Z'
    (0x7fc, 11), // '['
    (0x3ffffda, 26), // '\\'
    (0x7fd, 11), // ']'
    (0x3ffd, 14), // '^'
    (0x6e, 7), // '_'
    (0x3fffe, 18), // '`'
    (0x9, 5), // 'a'
    (0x6f, 7), // 'b'
    (0xa, 5), // 'c'
    (0x29, 6), // 'd'
    (0xb, 5), // 'e'
    (0x70, 7), // 'f'
    (0x2a, 6), // 'g'
    (0x2b, 6), // 'h'
    (0xc, 5), // 'i'
    (0xf5, 8), // 'j'
    (0xf6, 8), // 'k'
    (0x2c, 6), // 'l'
    (0x2d, 6), // 'm'
    (0x2e, 6), // 'n'
    (0xd, 5), // 'o'
    (0x2f, 6), // 'p'
    (0x1fc, 9), // 'q'
    (0x30, 6), // 'r'
    (0x31, 6), // 's'
    (0xe, 5), // 't'
    (0x71, 7), // 'u'
    (0x72, 7), // 'v'
    (0x73, 7), // 'w'
    (0x74, 7), // 'x'
    (0x75, 7), // 'y'
    (0xf7, 8), // 'z'
    (0x1fffd, 17), // '{'
    (0xffc, 12), // '|'
    (0x1fffe, 17), // '}'
    (0xffd, 12), // '~'
    (0x3ffffdb, 26),
    (0x3ffffdc, 26),
    (0x3ffffdd, 26),
    (0x3ffffde, 26),
    (0x3ffffdf, 26),
    (0x3ffffe0, 26),
    (0x3ffffe1, 26),
    (0x3ffffe2, 26),
    (0x3ffffe3, 26),
    (0x3ffffe4, 26),
    (0x3ffffe5, 26),
    (0x3ffffe6, 26),
    (0x3ffffe7, 26),
    (0x3ffffe8, 26),
    (0x3ffffe9, 26),
    (0x3ffffea, 26),
    (0x3ffffeb, 26),
    (0x3ffffec, 26),
    (0x3ffffed, 26),
    (0x3ffffee, 26),
    (0x3ffffef, 26),
    (0x3fffff0, 26),
    (0x3fffff1, 26),
    (0x3fffff2, 26),
    (0x3fffff3, 26),
    (0x3fffff4, 26),
    (0x3fffff5, 26),
    (0x3fffff6, 26),
    (0x3fffff7, 26),
    (0x3fffff8, 26),
    (0x3fffff9, 26),
    (0x3fffffa, 26),
    (0x3fffffb, 26),
    (0x3fffffc, 26),
    (0x3fffffd, 26),
    (0x3fffffe, 26),
    (0x3ffffff, 26),
    (0x1ffff80, 25),
    (0x1ffff81, 25),
    (0x1ffff82, 25),
    (0x1ffff83, 25),
    (0x1ffff84, 25),
    (0x1ffff85, 25),
    (0x1ffff86, 25),
    (0x1ffff87, 25),
    (0x1ffff88, 25),
    (0x1ffff89, 25),
    (0x1ffff8a, 25),
    (0x1ffff8b, 25),
    (0x1ffff8c, 25),
    (0x1ffff8d, 25),
    (0x1ffff8e, 25),
    (0x1ffff8f, 25),
    (0x1ffff90, 25),
    (0x1ffff91, 25),
    (0x1ffff92, 25),
    (0x1ffff93, 25),
    (0x1ffff94, 25),
    (0x1ffff95, 25),
    (0x1ffff96, 25),
    (0x1ffff97, 25),
    (0x1ffff98, 25),
    (0x1ffff99, 25),
    (0x1ffff9a, 25),
    (0x1ffff9b, 25),
    (0x1ffff9c, 25),
    (0x1ffff9d, 25),
    (0x1ffff9e, 25),
    (0x1ffff9f, 25),
    (0x1ffffa0, 25),
    (0x1ffffa1, 25),
    (0x1ffffa2, 25),
    (0x1ffffa3, 25),
    (0x1ffffa4, 25),
    (0x1ffffa5, 25),
    (0x1ffffa6, 25),
    (0x1ffffa7, 25),
    (0x1ffffa8, 25),
    (0x1ffffa9, 25),
    (0x1ffffaa, 25),
    (0x1ffffab, 25),
    (0x1ffffac, 25),
    (0x1ffffad, 25),
    (0x1ffffae, 25),
    (0x1ffffaf, 25),
    (0x1ffffb0, 25),
    (0x1ffffb1, 25),
    (0x1ffffb2, 25),
    (0x1ffffb3, 25),
    (0x1ffffb4, 25),
    (0x1ffffb5, 25),
    (0x1ffffb6, 25),
    (0x1ffffb7, 25),
    (0x1ffffb8, 25),
    (0x1ffffb9, 25),
    (0x1ffffba, 25),
    (0x1ffffbb, 25),
    (0x1ffffbc, 25),
    (0x1ffffbd, 25),
    (0x1ffffbe, 25),
    (0x1ffffbf, 25),
    (0x1ffffc0, 25),
    (0x1ffffc1, 25),
    (0x1ffffc2, 25),
    (0x1ffffc3, 25),
    (0x1ffffc4, 25),
    (0x1ffffc5, 25),
    (0x1ffffc6, 25),
    (0x1ffffc7, 25),
    (0x1ffffc8, 25),
    (0x1ffffc9, 25),
    (0x1ffffca, 25),
    (0x1ffffcb, 25),
    (0x1ffffcc, 25),
    (0x1ffffcd, 25),
    (0x1ffffce, 25),
    (0x1ffffcf, 25),
    (0x1ffffd0, 25),
    (0x1ffffd1, 25),
    (0x1ffffd2, 25),
    (0x1ffffd3, 25),
    (0x1ffffd4, 25),
    (0x1ffffd5, 25),
    (0x1ffffd6, 25),
    (0x1ffffd7, 25),
    (0x1ffffd8, 25),
    (0x1ffffd9, 25),
    (0x1ffffda, 25),
    (0x1ffffdb, 25),
    (0x1ffffdc, 25), // EOS
];

// -- Decode tree --

#[derive(Clone, Copy)]
enum Node {
    Internal { zero: u16, one: u16 },
    Leaf { sym: u16 },
}

const NONE: u16 = 0;

fn decode_tree() -> &'static [Node] {
    static TREE: OnceLock<Vec<Node>> = OnceLock::new();
    TREE.get_or_init(build_decode_tree)
}

fn build_decode_tree() -> Vec<Node> {
    let mut nodes = Vec::with_capacity(2 * HUFFMAN_TABLE.len());
    nodes.push(Node::Internal {
        zero: NONE,
        one: NONE,
    });

    for (sym, &(code, bits)) in HUFFMAN_TABLE.iter().enumerate() {
        let mut at = 0usize;
        for bit_pos in (0..bits).rev() {
            let bit = (code >> bit_pos) & 1;
            let Node::Internal { zero, one } = nodes[at] else {
                unreachable!("Huffman table is prefix-free");
            };
            let child = if bit == 0 { zero } else { one };
            let next = if child != NONE {
                child
            } else {
                let idx = nodes.len() as u16;
                nodes.push(if bit_pos == 0 {
                    Node::Leaf { sym: sym as u16 }
                } else {
                    Node::Internal {
                        zero: NONE,
                        one: NONE,
                    }
                });
                nodes[at] = if bit == 0 {
                    Node::Internal { zero: idx, one }
                } else {
                    Node::Internal { zero, one: idx }
                };
                idx
            };
            at = next as usize;
        }
    }

    nodes
}

// -- Public API --

/// Returns the Huffman-encoded length of `data` in octets.
pub fn encoded_len(data: &[u8]) -> usize {
    let bits: usize = data
        .iter()
        .map(|&b| HUFFMAN_TABLE[b as usize].1 as usize)
        .sum();
    bits.div_ceil(8)
}

/// Huffman-encodes `data`, appending the result to `out`.
pub fn encode_into(data: &[u8], out: &mut Vec<u8>) {
    let mut bits: u64 = 0;
    let mut bit_count = 0u32;

    for &byte in data {
        let (code, len) = HUFFMAN_TABLE[byte as usize];
        bits = (bits << len) | u64::from(code);
        bit_count += u32::from(len);

        while bit_count >= 8 {
            bit_count -= 8;
            out.push((bits >> bit_count) as u8);
        }
    }

    // Pad with the EOS prefix (all ones) to complete the last octet.
    if bit_count > 0 {
        let pad = 8 - bit_count;
        out.push(((bits << pad) as u8) | ((1u8 << pad) - 1));
    }
}

/// Huffman-encodes `data`.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(data));
    encode_into(data, &mut out);
    out
}

/// Decodes a Huffman-encoded literal.
///
/// Trailing bits that do not complete a code are treated as padding and
/// dropped. Decoding EOS inside the literal is an error.
pub fn decode(data: &[u8]) -> Result<Vec<u8>, HuffmanError> {
    let tree = decode_tree();
    let mut out = Vec::with_capacity(data.len() * 8 / 5);
    let mut at = 0usize;
    let mut code_start = 0usize;

    for (byte_idx, &byte) in data.iter().enumerate() {
        for bit_pos in (0..8).rev() {
            let Node::Internal { zero, one } = tree[at] else {
                unreachable!("decoder always rests on an internal node");
            };
            let next = if (byte >> bit_pos) & 1 == 0 { zero } else { one };
            if next == NONE {
                return Err(HuffmanError { bit: code_start });
            }
            match tree[next as usize] {
                Node::Leaf { sym } if sym as usize == EOS => {
                    return Err(HuffmanError { bit: code_start });
                }
                Node::Leaf { sym } => {
                    out.push(sym as u8);
                    at = 0;
                    code_start = byte_idx * 8 + (8 - bit_pos as usize);
                }
                Node::Internal { .. } => at = next as usize,
            }
        }
    }

    Ok(out)
}

//! Adaptive Huffman string compression (§4.1.1), built once from a
//! precomputed English-text frequency table and kept as a process-wide
//! lazy singleton — the table is baked in, not learned at runtime, so the
//! tree is identical across every server instance and matches the
//! original client's expectations bit-for-bit.

use crate::bitstream::BitStream;
use lazy_static::lazy_static;

/// The 256-entry English character frequency table the tree is built
/// from, transcribed verbatim from the original protocol's string
/// compressor so the resulting codewords match byte-for-byte.
#[rustfmt::skip]
pub const ENGLISH_FREQUENCIES: [u32; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 722, 0, 0, 2, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    11084, 58, 63, 1, 0, 31, 0, 317, 64, 64, 44, 0, 695, 62, 980, 266,
    69, 67, 56, 7, 73, 3, 14, 2, 69, 1, 167, 9, 1, 2, 25, 94,
    0, 195, 139, 34, 96, 48, 103, 56, 125, 653, 21, 5, 23, 64, 85, 44,
    34, 7, 92, 76, 147, 12, 14, 57, 15, 39, 15, 1, 1, 1, 2, 3,
    0, 3611, 845, 1077, 1884, 5870, 841, 1057, 2501, 3212, 164, 531, 2019, 1330, 3056, 4037,
    848, 47, 2586, 2919, 4771, 1707, 535, 1106, 152, 1243, 100, 0, 2, 0, 10, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

#[derive(Clone)]
struct Node {
    weight: u32,
    value: u8,
    left: Option<usize>,
    right: Option<usize>,
    parent: Option<usize>,
}

#[derive(Clone)]
struct Codeword {
    bits: Vec<bool>,
}

struct HuffmanTree {
    nodes: Vec<Node>,
    root: usize,
    table: Vec<Codeword>,
}

impl HuffmanTree {
    fn build(frequency_table: &[u32; 256]) -> Self {
        let mut nodes = Vec::with_capacity(512);
        let mut leaf_index = [0usize; 256];

        // Insertion-sorted worklist of node indices, ordered by weight.
        // The reference implementation uses a weight-sorted linked list
        // with linear insertion rather than a heap; ties among equal
        // weights are broken in the order nodes were inserted, which in
        // turn decides which codeword each tied byte gets. We reproduce
        // that by keeping a `Vec` sorted with a stable linear insert.
        let mut worklist: Vec<usize> = Vec::with_capacity(256);

        for counter in 0..256u32 {
            let mut weight = frequency_table[counter as usize];
            if weight == 0 {
                weight = 1;
            }
            let idx = nodes.len();
            nodes.push(Node {
                weight,
                value: counter as u8,
                left: None,
                right: None,
                parent: None,
            });
            leaf_index[counter as usize] = idx;
            Self::insert_sorted(&mut worklist, &nodes, idx);
        }

        while worklist.len() > 1 {
            let lesser = worklist.remove(0);
            let greater = worklist.remove(0);
            let weight = nodes[lesser].weight + nodes[greater].weight;
            let parent_idx = nodes.len();
            nodes.push(Node {
                weight,
                value: 0,
                left: Some(lesser),
                right: Some(greater),
                parent: None,
            });
            nodes[lesser].parent = Some(parent_idx);
            nodes[greater].parent = Some(parent_idx);

            if worklist.is_empty() {
                let root = parent_idx;
                let mut tree = HuffmanTree {
                    nodes,
                    root,
                    table: Vec::new(),
                };
                tree.generate_table(&leaf_index);
                return tree;
            }

            Self::insert_sorted(&mut worklist, &nodes, parent_idx);
        }

        unreachable!("256 leaves always merge down to exactly one root");
    }

    fn insert_sorted(worklist: &mut Vec<usize>, nodes: &[Node], idx: usize) {
        let weight = nodes[idx].weight;
        let pos = worklist
            .iter()
            .position(|&other| nodes[other].weight >= weight)
            .unwrap_or(worklist.len());
        worklist.insert(pos, idx);
    }

    fn generate_table(&mut self, leaf_index: &[usize; 256]) {
        let mut table = Vec::with_capacity(256);
        for &leaf in leaf_index.iter() {
            let mut path = Vec::new();
            let mut current = leaf;
            while current != self.root {
                let parent = self.nodes[current].parent.expect("non-root has a parent");
                let came_from_left = self.nodes[parent].left == Some(current);
                path.push(!came_from_left); // false = left, true = right
                current = parent;
            }
            path.reverse();
            table.push(Codeword { bits: path });
        }
        self.table = table;
    }

    /// Writes the Huffman-coded path for each input byte, then pads the
    /// output to a byte boundary using a prefix of whatever codeword in
    /// the table is longer than the remaining bit budget, exactly as the
    /// original `EncodeArray` does.
    fn encode_array(&self, input: &[u8], output: &mut BitStream) {
        for &byte in input {
            let codeword = &self.table[byte as usize];
            for &bit in &codeword.bits {
                output.write_bit(bit);
            }
        }

        let used = output.bits_used();
        if used % 8 != 0 {
            let remaining_bits = 8 - (used % 8);
            for codeword in self.table.iter() {
                if codeword.bits.len() > remaining_bits {
                    for &bit in codeword.bits.iter().take(remaining_bits) {
                        output.write_bit(bit);
                    }
                    return;
                }
            }
            unreachable!("256 codewords always include one longer than 7 bits");
        }
    }

    /// Walks the tree bit by bit, emitting a byte at each leaf, stopping
    /// at `size_in_bits` or `max_chars`, whichever comes first. If the
    /// max is hit first and `skip` is set, the remaining declared bits
    /// are consumed from `input` without being materialized.
    fn decode_array(
        &self,
        input: &mut BitStream,
        size_in_bits: usize,
        max_chars: usize,
        skip: bool,
    ) -> Vec<u8> {
        let mut out = Vec::new();
        let mut current = self.root;
        let mut remaining = size_in_bits;

        while remaining > 0 {
            if out.len() == max_chars {
                if skip {
                    input.ignore_bits(remaining);
                }
                return out;
            }

            let bit = match input.read_bit() {
                Some(b) => b,
                None => break,
            };
            current = if !bit {
                self.nodes[current].left.expect("left child exists for non-leaf")
            } else {
                self.nodes[current].right.expect("right child exists for non-leaf")
            };

            if self.nodes[current].left.is_none() && self.nodes[current].right.is_none() {
                out.push(self.nodes[current].value);
                current = self.root;
            }

            remaining -= 1;
        }

        out
    }
}

lazy_static! {
    static ref TREE: HuffmanTree = HuffmanTree::build(&ENGLISH_FREQUENCIES);
}

/// Encodes `input` as: a compressed 16-bit bit-length, then the
/// Huffman-coded payload. `max_chars`, if given, caps how many input
/// bytes are encoded (matching `StringCompressor::EncodeString`'s
/// `maxCharsToWrite` semantics: the cap includes the implicit
/// terminator, so at most `max_chars - 1` bytes are encoded).
pub fn encode_string(input: &[u8], max_chars: Option<usize>, output: &mut BitStream) {
    let chars_to_write = match max_chars {
        Some(max) if input.len() >= max => max - 1,
        _ => input.len(),
    };

    let mut encoded = BitStream::new();
    TREE.encode_array(&input[..chars_to_write], &mut encoded);

    let bit_length = encoded.bits_used() as u16;
    output.write_compressed_u16(bit_length);
    output.write_bits(encoded.as_bytes(), bit_length as usize);
}

/// Decodes a Huffman-compressed string previously written with
/// `encode_string`, capped at `max_chars - 1` output bytes.
pub fn decode_string(input: &mut BitStream, max_chars: usize) -> Option<String> {
    let bit_length = input.read_compressed_u16()? as usize;
    if input.unread_bits() < bit_length {
        return None;
    }
    let bytes = TREE.decode_array(input, bit_length, max_chars.saturating_sub(1), true);
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

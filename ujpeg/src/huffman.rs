// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use crate::bit_reader::BitReader;
use crate::error::{Error, Result};
use crate::util::NewWithCapacity;

/// Number of bits indexing the flat lookup table; also the longest code.
pub const LOOKUP_BITS: usize = 16;
const LOOKUP_SIZE: usize = 1 << LOOKUP_BITS;

/// Number of table slots: DC 0/1 and AC 0/1.
pub const NUM_SLOTS: usize = 4;

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct HuffmanCode {
    /// Code length; 0 marks code space no symbol claimed.
    pub bits: u8,
    pub symbol: u8,
}

/// Canonical Huffman table expanded into a 2^16 entry lookup, indexed by the
/// next 16 bits of the stream.
#[derive(Clone, Default)]
pub struct HuffmanTable {
    lookup: Vec<HuffmanCode>,
}

impl Debug for HuffmanTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.lookup.is_empty() {
            return write!(f, "HuffmanTable(undefined)");
        }
        let used = self.lookup.iter().filter(|c| c.bits != 0).count();
        write!(f, "HuffmanTable({used}/{LOOKUP_SIZE} entries used)")
    }
}

impl HuffmanTable {
    /// Builds a table from the 16 per-length counts and the symbols in code
    /// order, as found in a DHT segment.
    pub fn build(counts: &[u8; 16], symbols: &[u8]) -> Result<HuffmanTable> {
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        if symbols.len() < total {
            return Err(Error::TruncatedSegment("DHT"));
        }
        let mut lookup = Vec::new_with_capacity(LOOKUP_SIZE)?;
        let mut remain = LOOKUP_SIZE as i64;
        let mut symbols = symbols.iter();
        for (i, &count) in counts.iter().enumerate() {
            let bits = i + 1;
            let spread = 1usize << (LOOKUP_BITS - bits);
            remain -= (count as usize * spread) as i64;
            if remain < 0 {
                return Err(Error::HuffmanOvercommitted);
            }
            for &symbol in symbols.by_ref().take(count as usize) {
                let code = HuffmanCode {
                    bits: bits as u8,
                    symbol,
                };
                lookup.extend(std::iter::repeat_n(code, spread));
            }
        }
        lookup.resize(LOOKUP_SIZE, HuffmanCode::default());
        Ok(HuffmanTable { lookup })
    }

    pub fn is_defined(&self) -> bool {
        !self.lookup.is_empty()
    }

    pub fn decode_symbol(&self, br: &mut BitReader) -> Result<u8> {
        if self.lookup.is_empty() {
            return Err(Error::UndefinedHuffmanCode);
        }
        let code = self.lookup[br.peek_bits(LOOKUP_BITS)? as usize];
        if code.bits == 0 {
            return Err(Error::UndefinedHuffmanCode);
        }
        br.skip_bits(code.bits as usize)?;
        Ok(code.symbol)
    }
}

// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use crate::error::{Error, Result};

/// Reads bits, most significant first, from the entropy-coded segment of a
/// scan.
///
/// Stuffed `ff 00` (and `ff ff`) sequences are collapsed into a single `ff`
/// byte. Restart markers are handed through as two raw bytes so that the
/// scan decoder can verify them after [`BitReader::align_to_byte`]. Once the
/// input is exhausted, or an end-of-image marker is met, the reader produces
/// 1-bits forever: truncated streams decode as far as possible instead of
/// failing outright.
#[derive(Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_buf: u64,
    bits_in_buf: usize,
    total_bits_read: usize,
}

impl Debug for BitReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BitReader{{ data: [{} bytes], bit_buf: {:0width$b}, total_bits_read: {} }}",
            self.data.len(),
            self.bit_buf & ((1u64 << self.bits_in_buf) - 1),
            self.total_bits_read,
            width = self.bits_in_buf
        )
    }
}

pub const MAX_BITS_PER_CALL: usize = 16;

impl<'a> BitReader<'a> {
    /// Constructs a BitReader for the bytes following a scan header.
    pub fn new(data: &'a [u8]) -> BitReader<'a> {
        BitReader {
            data,
            bit_buf: 0,
            bits_in_buf: 0,
            total_bits_read: 0,
        }
    }

    /// Returns the next `num` bits without consuming them.
    pub fn peek_bits(&mut self, num: usize) -> Result<u32> {
        debug_assert!(num <= MAX_BITS_PER_CALL);
        if num == 0 {
            return Ok(0);
        }
        self.refill(num)?;
        let shift = self.bits_in_buf - num;
        Ok(((self.bit_buf >> shift) & ((1u64 << num) - 1)) as u32)
    }

    /// Consumes `num` bits, pulling in fresh bytes as needed.
    pub fn skip_bits(&mut self, num: usize) -> Result<()> {
        debug_assert!(num <= MAX_BITS_PER_CALL);
        if self.bits_in_buf < num {
            self.refill(num)?;
        }
        self.bits_in_buf -= num;
        self.total_bits_read += num;
        Ok(())
    }

    /// Reads `num` bits.
    /// ```
    /// # use ujpeg::bit_reader::BitReader;
    /// let mut br = BitReader::new(&[0xa5, 0xff, 0x00, 0x0f]);
    /// assert_eq!(br.read_bits(4)?, 0xa);
    /// assert_eq!(br.read_bits(12)?, 0x5ff);
    /// assert_eq!(br.read_bits(8)?, 0x0f);
    /// assert_eq!(br.total_bits_read(), 24);
    /// # Ok::<(), ujpeg::error::Error>(())
    /// ```
    pub fn read_bits(&mut self, num: usize) -> Result<u32> {
        let ret = self.peek_bits(num)?;
        self.skip_bits(num)?;
        Ok(ret)
    }

    /// Discards buffered bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        let partial = self.bits_in_buf % 8;
        self.bits_in_buf -= partial;
        self.total_bits_read += partial;
    }

    /// Returns the number of bits consumed so far, including padding bits
    /// synthesized past the end of the input.
    pub fn total_bits_read(&self) -> usize {
        self.total_bits_read
    }

    fn push_byte(&mut self, byte: u8) {
        self.bit_buf = (self.bit_buf << 8) | byte as u64;
        self.bits_in_buf += 8;
    }

    fn refill(&mut self, num: usize) -> Result<()> {
        while self.bits_in_buf < num {
            let Some((&byte, rest)) = self.data.split_first() else {
                self.push_byte(0xff);
                continue;
            };
            self.data = rest;
            self.push_byte(byte);
            if byte != 0xff {
                continue;
            }
            // A lone trailing escape byte is treated like the end of input.
            let Some((&next, rest)) = self.data.split_first() else {
                continue;
            };
            self.data = rest;
            match next {
                0x00 | 0xff => {}
                0xd9 => self.data = &[],
                0xd0..=0xd7 => self.push_byte(next),
                _ => return Err(Error::InvalidEscape(next)),
            }
        }
        Ok(())
    }
}

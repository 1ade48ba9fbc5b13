// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::BLOCK_SIZE;

/// Natural (row-major) block position of each zigzag index.
pub const ZIGZAG: [u8; BLOCK_SIZE] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// Number of quantization table slots.
pub const NUM_SLOTS: usize = 4;

/// An 8-bit quantization table, stored in zigzag order like the stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QuantTable {
    values: [u8; BLOCK_SIZE],
}

impl QuantTable {
    pub fn from_zigzag(values: &[u8; BLOCK_SIZE]) -> QuantTable {
        QuantTable { values: *values }
    }

    /// Multiplier for the coefficient at zigzag index `k`.
    #[inline(always)]
    pub fn at_zigzag(&self, k: usize) -> i32 {
        self.values[k] as i32
    }
}

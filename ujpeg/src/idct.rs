// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Separable 8x8 integer inverse DCT.
//!
//! A row pass scales the dequantized coefficients up by 2^8 in place; a
//! column pass brings them back down, level-shifts by 128 and writes clamped
//! 8-bit samples. Both passes short-circuit when every AC term of the line
//! is zero, which produces exactly what the full butterfly would.
//!
//! Intermediates use wrapping arithmetic: valid streams never come close to
//! overflowing, corrupt ones produce garbage pixels instead of a panic.

use std::num::Wrapping;

use crate::{BLOCK_DIM, BLOCK_SIZE, util::clip};

type Fx = Wrapping<i32>;

const W1: Fx = Wrapping(2841);
const W2: Fx = Wrapping(2676);
const W3: Fx = Wrapping(2408);
const W5: Fx = Wrapping(1609);
const W6: Fx = Wrapping(1108);
const W7: Fx = Wrapping(565);
const R2: Fx = Wrapping(181);

/// Transforms a block of dequantized coefficients (natural order) and writes
/// the 8x8 samples to `out`, whose rows are `stride` bytes apart.
///
/// `block` is used as scratch space and is clobbered.
pub fn idct_8x8(block: &mut [i32; BLOCK_SIZE], out: &mut [u8], stride: usize) {
    for row in block.chunks_exact_mut(BLOCK_DIM) {
        row_idct(row);
    }
    for col in 0..BLOCK_DIM {
        col_idct(block, col, out, stride);
    }
}

fn row_idct(row: &mut [i32]) {
    if row[1..].iter().all(|&c| c == 0) {
        let dc = row[0] << 3;
        row.fill(dc);
        return;
    }
    row_idct_full(row);
}

fn row_idct_full(row: &mut [i32]) {
    let blk = |i: usize| Wrapping(row[i]);
    let mut x0 = (blk(0) << 11) + Wrapping(128);
    let mut x1 = blk(4) << 11;
    let mut x2 = blk(6);
    let mut x3 = blk(2);
    let mut x4 = blk(1);
    let mut x5 = blk(7);
    let mut x6 = blk(5);
    let mut x7 = blk(3);
    let mut x8 = W7 * (x4 + x5);
    x4 = x8 + (W1 - W7) * x4;
    x5 = x8 - (W1 + W7) * x5;
    x8 = W3 * (x6 + x7);
    x6 = x8 - (W3 - W5) * x6;
    x7 = x8 - (W3 + W5) * x7;
    x8 = x0 + x1;
    x0 -= x1;
    x1 = W6 * (x3 + x2);
    x2 = x1 - (W2 + W6) * x2;
    x3 = x1 + (W2 - W6) * x3;
    x1 = x4 + x6;
    x4 -= x6;
    x6 = x5 + x7;
    x5 -= x7;
    x7 = x8 + x3;
    x8 -= x3;
    x3 = x0 + x2;
    x0 -= x2;
    x2 = (R2 * (x4 + x5) + Wrapping(128)) >> 8;
    x4 = (R2 * (x4 - x5) + Wrapping(128)) >> 8;
    let out = [
        (x7 + x1) >> 8,
        (x3 + x2) >> 8,
        (x0 + x4) >> 8,
        (x8 + x6) >> 8,
        (x8 - x6) >> 8,
        (x0 - x4) >> 8,
        (x3 - x2) >> 8,
        (x7 - x1) >> 8,
    ];
    for (dst, v) in row.iter_mut().zip(out) {
        *dst = v.0;
    }
}

fn col_idct(block: &[i32; BLOCK_SIZE], col: usize, out: &mut [u8], stride: usize) {
    let at = |i: usize| block[i * BLOCK_DIM + col];
    if (1..BLOCK_DIM).all(|i| at(i) == 0) {
        let v = clip(((Wrapping(at(0)) + Wrapping(32)) >> 6).0 + 128);
        for y in 0..BLOCK_DIM {
            out[y * stride + col] = v;
        }
        return;
    }
    col_idct_full(block, col, out, stride);
}

fn col_idct_full(block: &[i32; BLOCK_SIZE], col: usize, out: &mut [u8], stride: usize) {
    let blk = |i: usize| Wrapping(block[i * BLOCK_DIM + col]);
    let mut x0 = (blk(0) << 8) + Wrapping(8192);
    let mut x1 = blk(4) << 8;
    let mut x2 = blk(6);
    let mut x3 = blk(2);
    let mut x4 = blk(1);
    let mut x5 = blk(7);
    let mut x6 = blk(5);
    let mut x7 = blk(3);
    let four = Wrapping(4);
    let mut x8 = W7 * (x4 + x5) + four;
    x4 = (x8 + (W1 - W7) * x4) >> 3;
    x5 = (x8 - (W1 + W7) * x5) >> 3;
    x8 = W3 * (x6 + x7) + four;
    x6 = (x8 - (W3 - W5) * x6) >> 3;
    x7 = (x8 - (W3 + W5) * x7) >> 3;
    x8 = x0 + x1;
    x0 -= x1;
    x1 = W6 * (x3 + x2) + four;
    x2 = (x1 - (W2 + W6) * x2) >> 3;
    x3 = (x1 + (W2 - W6) * x3) >> 3;
    x1 = x4 + x6;
    x4 -= x6;
    x6 = x5 + x7;
    x5 -= x7;
    x7 = x8 + x3;
    x8 -= x3;
    x3 = x0 + x2;
    x0 -= x2;
    x2 = (R2 * (x4 + x5) + Wrapping(128)) >> 8;
    x4 = (R2 * (x4 - x5) + Wrapping(128)) >> 8;
    let samples = [
        x7 + x1,
        x3 + x2,
        x0 + x4,
        x8 + x6,
        x8 - x6,
        x0 - x4,
        x3 - x2,
        x7 - x1,
    ];
    for (y, v) in samples.into_iter().enumerate() {
        out[y * stride + col] = clip((v >> 14).0 + 128);
    }
}

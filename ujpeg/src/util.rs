// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

pub(crate) mod tracing_wrappers;
mod vec_helpers;

pub use vec_helpers::*;

/// Clamps a fixed-point intermediate to the 8-bit sample range.
#[inline(always)]
pub(crate) fn clip(x: i32) -> u8 {
    x.clamp(0, 255) as u8
}

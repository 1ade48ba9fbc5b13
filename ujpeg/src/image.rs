// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use crate::{
    error::{Error, Result},
    util::{tracing_wrappers::*, try_filled},
};

/// One 8-bit sample plane.
///
/// Rows are `stride` bytes apart. Right after decoding, the stride and the
/// allocated row count cover the whole MCU grid, so a plane is usually larger
/// than its logical `width() x height()`; after upsampling the two coincide.
#[derive(Clone, PartialEq, Eq)]
pub struct Plane {
    width: usize,
    height: usize,
    stride: usize,
    data: Vec<u8>,
}

impl Debug for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Plane {}x{} (stride {}, {} rows allocated)",
            self.width,
            self.height,
            self.stride,
            self.data.len().checked_div(self.stride).unwrap_or(0)
        )
    }
}

impl Plane {
    /// Allocates a `stride x rows` buffer filled with `value`, of which the
    /// top-left `width x height` is the visible plane.
    pub(crate) fn new_filled(
        (width, height): (usize, usize),
        (stride, rows): (usize, usize),
        value: u8,
    ) -> Result<Plane> {
        // These limits let us not worry about overflows.
        if stride as u64 >= i64::MAX as u64 / 4 || rows as u64 >= i64::MAX as u64 / 4 {
            return Err(Error::ImageSizeTooLarge(stride, rows));
        }
        let total_size = stride
            .checked_mul(rows)
            .ok_or(Error::ImageSizeTooLarge(stride, rows))?;
        if width == 0 || height == 0 || width > stride || height > rows {
            return Err(Error::UnsupportedImageSize(width, height));
        }
        debug!("allocating {stride}x{rows} plane");
        Ok(Plane {
            width,
            height,
            stride,
            data: try_filled(total_size, value)?,
        })
    }

    /// Wraps tightly packed rows.
    pub(crate) fn from_packed(width: usize, height: usize, data: Vec<u8>) -> Plane {
        debug_assert_eq!(data.len(), width * height);
        Plane {
            width,
            height,
            stride: width,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Distance in bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The whole backing buffer, including any padding.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// The visible part of row `y`.
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::error::{Error, ErrorKind};

/// Layout of the interleaved raster produced by [`super::Decoder::image`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PixelFormat {
    /// One byte per pixel for grayscale images, RGB for color ones.
    #[default]
    Native,
    Rgb8,
    /// RGB plus an opaque alpha channel.
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self, is_color: bool) -> usize {
        match self {
            PixelFormat::Native if is_color => 3,
            PixelFormat::Native => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Outcome of a successful call to [`super::Decoder::decode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// Every block of the scan was decoded.
    Complete,
    /// Pixel decoding was disabled; only geometry is available.
    HeadersOnly,
    /// Entropy decoding stopped early. Blocks decoded before the error are
    /// kept; the rest of the image is mid-gray.
    Partial(Error),
}

/// Result of the most recent operation on a decoder.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Ok,
    Failed(ErrorKind),
}

impl Status {
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

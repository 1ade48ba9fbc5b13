// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

/// How subsampled chroma planes are brought up to full resolution.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ChromaMode {
    /// Multi-tap filters that honor the chroma siting declared in Exif.
    #[default]
    Accurate,
    /// Nearest-neighbour replication. Exif is not inspected in this mode.
    Fast,
}

#[derive(Debug, Clone, Default)]
pub struct DecoderOptions {
    /// Stop after the scan header: geometry is available, pixels are not.
    pub skip_pixel_decode: bool,
    pub chroma_mode: ChromaMode,
    /// Frames with more than this many pixels are rejected before any plane
    /// is allocated.
    pub pixel_limit: Option<usize>,
}

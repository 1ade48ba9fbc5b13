// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::time::{Duration, Instant};

use color_eyre::eyre::{Result, eyre};
use ujpeg::{ChromaMode, ChromaSiting, Decoded, Decoder, DecoderOptions, Error, PixelFormat};

/// Header probing never looks past this many bytes.
pub const INFO_PROBE_LIMIT: usize = 256 * 1024;

/// Frames larger than this are refused.
pub const PIXEL_LIMIT: usize = 1 << 28;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub size: (usize, usize),
    pub num_components: usize,
    pub chroma_siting: ChromaSiting,
}

pub struct DecodeOutput {
    pub info: ImageInfo,
    /// Samples per pixel of `pixels`.
    pub channels: usize,
    pub pixels: Vec<u8>,
    /// Set when the entropy-coded data was damaged; `pixels` then holds
    /// whatever was decoded before the error.
    pub warning: Option<Error>,
}

fn image_info(decoder: &Decoder) -> Result<ImageInfo> {
    Ok(ImageInfo {
        size: (decoder.width()?, decoder.height()?),
        num_components: decoder.num_components()?,
        chroma_siting: decoder.chroma_siting()?,
    })
}

/// Reads the headers only. Large inputs are cut to [`INFO_PROBE_LIMIT`].
pub fn probe(data: &[u8]) -> Result<ImageInfo> {
    let data = &data[..data.len().min(INFO_PROBE_LIMIT)];
    let mut decoder = Decoder::new(DecoderOptions {
        skip_pixel_decode: true,
        pixel_limit: Some(PIXEL_LIMIT),
        ..Default::default()
    });
    decoder.decode(data)?;
    image_info(&decoder)
}

pub fn decode(data: &[u8], chroma_mode: ChromaMode, rgba: bool) -> Result<(DecodeOutput, Duration)> {
    let start = Instant::now();
    let mut decoder = Decoder::new(DecoderOptions {
        chroma_mode,
        pixel_limit: Some(PIXEL_LIMIT),
        ..Default::default()
    });
    let warning = match decoder.decode(data)? {
        Decoded::Complete => None,
        Decoded::Partial(err) => Some(err),
        Decoded::HeadersOnly => return Err(eyre!("Decoder produced no pixels")),
    };
    let info = image_info(&decoder)?;
    let format = if rgba {
        PixelFormat::Rgba8
    } else {
        PixelFormat::Native
    };
    let channels = format.bytes_per_pixel(info.num_components == 3);
    let pixels = decoder.image(format)?.to_vec();
    Ok((
        DecodeOutput {
            info,
            channels,
            pixels,
            warning,
        },
        start.elapsed(),
    ))
}

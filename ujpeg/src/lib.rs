// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! A small, single-pass decoder for baseline JPEG images.
//!
//! Only sequential DCT frames with 8-bit samples and Huffman coding are
//! supported, with one or three components and power-of-two chroma
//! subsampling. See [`api::Decoder`] for the entry point.

#![deny(unsafe_code)]
pub mod api;
pub mod bit_reader;
mod block;
mod color;
pub mod error;
mod exif;
pub mod huffman;
pub mod idct;
pub mod image;
mod marker;
mod parser;
pub mod quant;
mod upsample;
mod util;

pub use api::{
    ChromaMode, ChromaSiting, Decoded, Decoder, DecoderOptions, PixelFormat, Status,
};
pub use error::{Error, ErrorKind, Result};

const BLOCK_DIM: usize = 8;
const BLOCK_SIZE: usize = BLOCK_DIM * BLOCK_DIM;

// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::collections::TryReserveError;

use thiserror::Error;

/// Coarse classification of [`Error`]s, mirroring the decoder's result codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad signature, bad segment length, truncated or inconsistent segment.
    MalformedContainer,
    /// Valid input using a feature this decoder does not implement.
    Unsupported,
    /// Over-committed Huffman table or undefined code in the entropy stream.
    HuffmanCorruption,
    /// An allocation failed.
    ResourceExhaustion,
    /// Expected restart marker missing or out of sequence.
    RestartSync,
    /// The requested data requires a (successfully started) decode.
    NotDecoded,
    /// Invalid argument passed to an API call.
    InvalidArgument,
    /// Internal invariant violated.
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Not a JPEG file: signature {0:02x}{1:02x}, expected ffd8")]
    InvalidSignature(u8, u8),
    #[error("Input too short for a JPEG signature")]
    MissingSignature,
    #[error("Expected marker at offset {0}")]
    ExpectedMarker(usize),
    #[error("Segment length {length} at offset {offset} exceeds the {remaining} remaining bytes")]
    SegmentTooLong {
        offset: usize,
        length: usize,
        remaining: usize,
    },
    #[error("Segment length field {0} is smaller than the field itself")]
    SegmentTooShort(u16),
    #[error("Truncated {0} segment")]
    TruncatedSegment(&'static str),
    #[error("Duplicate frame header")]
    DuplicateFrame,
    #[error("{0} marker before frame header")]
    MissingFrame(&'static str),
    #[error("End of image reached before start of scan")]
    MissingScan,
    #[error("Invalid sampling factor {0} for component {1}")]
    InvalidSamplingFactor(u8, usize),
    #[error("Invalid quantization table selector {0}")]
    InvalidQuantSelector(u8),
    #[error("Quantization table {0} used but never defined")]
    UndefinedQuantTable(usize),
    #[error("Invalid Huffman table class/id byte {0:02x}")]
    InvalidHuffmanClass(u8),
    #[error("Huffman table {0} used but never defined")]
    UndefinedHuffmanTable(usize),
    #[error("Scan component id {found} does not match frame component id {expected}")]
    ScanComponentMismatch { expected: u8, found: u8 },
    #[error("Invalid Huffman table selectors {0:02x}")]
    InvalidTableSelectors(u8),
    #[error("Invalid escape sequence ff{0:02x} in entropy-coded data")]
    InvalidEscape(u8),
    #[error("Invalid run/size symbol {0:02x}")]
    InvalidRunSize(u8),
    #[error("Coefficient index {0} past the end of the block")]
    CoefficientOverflow(usize),

    #[error("Unsupported sample precision: {0} bits")]
    UnsupportedPrecision(u8),
    #[error("Unsupported number of components: {0}")]
    UnsupportedComponentCount(u8),
    #[error("Unsupported frame type: SOF{0}")]
    UnsupportedFrameType(u8),
    #[error("Arithmetic coding is not supported")]
    ArithmeticCoding,
    #[error("Unsupported marker ff{0:02x}")]
    UnsupportedMarker(u8),
    #[error("Unsupported sampling factor {0} for component {1}")]
    UnsupportedSamplingFactor(u8, usize),
    #[error("Subsampled plane {0} is {1}x{2}, too small to upsample")]
    PlaneTooSmall(usize, usize, usize),
    #[error("Unsupported image size: {0}x{1}")]
    UnsupportedImageSize(usize, usize),
    #[error("Image of {0} pixels exceeds the limit of {1}")]
    PixelLimitExceeded(usize, usize),
    #[error("Unsupported 16-bit quantization table {0}")]
    UnsupportedQuantPrecision(u8),
    #[error("Unsupported Huffman table id {0}")]
    UnsupportedHuffmanId(u8),
    #[error("Scan covers {0} components, only full interleaved scans are supported")]
    UnsupportedScanComponents(u8),
    #[error("Unsupported spectral selection {0}..{1}, approximation {2:02x}")]
    UnsupportedSpectralSelection(u8, u8, u8),

    #[error("Huffman code lengths over-commit the code space")]
    HuffmanOvercommitted,
    #[error("Undefined Huffman code in entropy-coded data")]
    UndefinedHuffmanCode,

    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
    #[error("Image size too large: {0}x{1}")]
    ImageSizeTooLarge(usize, usize),

    #[error("Expected restart marker {expected}, found {found:04x}")]
    RestartMismatch { expected: u8, found: u16 },

    #[error("Image has not been decoded")]
    NotDecoded,
    #[error("Plane index {0} out of range for {1} components")]
    PlaneOutOfRange(usize, usize),
    #[error("Destination buffer holds {0} bytes, {1} required")]
    BufferTooSmall(usize, usize),

    #[error("Plane {0} could not be upsampled to the frame size")]
    UpsampleIncomplete(usize),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            InvalidSignature(..)
            | MissingSignature
            | ExpectedMarker(_)
            | SegmentTooLong { .. }
            | SegmentTooShort(_)
            | TruncatedSegment(_)
            | DuplicateFrame
            | MissingFrame(_)
            | MissingScan
            | InvalidSamplingFactor(..)
            | InvalidQuantSelector(_)
            | UndefinedQuantTable(_)
            | InvalidHuffmanClass(_)
            | UndefinedHuffmanTable(_)
            | ScanComponentMismatch { .. }
            | InvalidTableSelectors(_) => ErrorKind::MalformedContainer,
            UnsupportedPrecision(_)
            | UnsupportedComponentCount(_)
            | UnsupportedFrameType(_)
            | ArithmeticCoding
            | UnsupportedMarker(_)
            | UnsupportedSamplingFactor(..)
            | PlaneTooSmall(..)
            | UnsupportedImageSize(..)
            | PixelLimitExceeded(..)
            | UnsupportedQuantPrecision(_)
            | UnsupportedHuffmanId(_)
            | UnsupportedScanComponents(_)
            | UnsupportedSpectralSelection(..) => ErrorKind::Unsupported,
            HuffmanOvercommitted
            | UndefinedHuffmanCode
            | InvalidRunSize(_)
            | CoefficientOverflow(_)
            | InvalidEscape(_) => ErrorKind::HuffmanCorruption,
            OutOfMemory(_) | ImageSizeTooLarge(..) => ErrorKind::ResourceExhaustion,
            RestartMismatch { .. } => ErrorKind::RestartSync,
            NotDecoded => ErrorKind::NotDecoded,
            PlaneOutOfRange(..) | BufferTooSmall(..) => ErrorKind::InvalidArgument,
            UpsampleIncomplete(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

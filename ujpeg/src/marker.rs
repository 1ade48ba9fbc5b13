// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Marker {
    /// Start of frame; the payload is the process number (0 = baseline).
    Sof(u8),
    Dht,
    Dac,
    Rst(u8),
    Soi,
    Eoi,
    Sos,
    Dqt,
    Dri,
    App(u8),
    Com,
    Other(u8),
}

impl From<u8> for Marker {
    fn from(code: u8) -> Marker {
        match code {
            0xc4 => Marker::Dht,
            0xcc => Marker::Dac,
            0xc0..=0xcf if code != 0xc8 => Marker::Sof(code - 0xc0),
            0xd0..=0xd7 => Marker::Rst(code - 0xd0),
            0xd8 => Marker::Soi,
            0xd9 => Marker::Eoi,
            0xda => Marker::Sos,
            0xdb => Marker::Dqt,
            0xdd => Marker::Dri,
            0xe0..=0xef => Marker::App(code - 0xe0),
            0xfe => Marker::Com,
            _ => Marker::Other(code),
        }
    }
}

/// Walks the marker segments of a JPEG stream.
pub(crate) struct MarkerReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> MarkerReader<'a> {
    /// Checks the start-of-image signature and positions the reader after it.
    pub fn new(data: &'a [u8]) -> Result<MarkerReader<'a>> {
        match data {
            [0xff, 0xd8, ..] => Ok(MarkerReader { data, offset: 2 }),
            [a, b, ..] => Err(Error::InvalidSignature(*a, *b)),
            _ => Err(Error::MissingSignature),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Everything after the current position.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    /// Reads the next marker code, skipping fill bytes.
    pub fn next_marker(&mut self) -> Result<Marker> {
        if self.data.get(self.offset) != Some(&0xff) {
            return Err(Error::ExpectedMarker(self.offset));
        }
        let start = self.offset;
        while self.data.get(self.offset) == Some(&0xff) {
            self.offset += 1;
        }
        match self.data.get(self.offset) {
            Some(&code) => {
                self.offset += 1;
                Ok(Marker::from(code))
            }
            None => Err(Error::ExpectedMarker(start)),
        }
    }

    /// Reads a length-prefixed segment and returns its payload.
    pub fn read_segment(&mut self) -> Result<&'a [u8]> {
        let rest = self.remaining();
        if rest.len() < 2 {
            return Err(Error::TruncatedSegment("marker"));
        }
        let length = BigEndian::read_u16(rest);
        if length < 2 {
            return Err(Error::SegmentTooShort(length));
        }
        let payload_len = length as usize - 2;
        let rest = &rest[2..];
        if payload_len > rest.len() {
            return Err(Error::SegmentTooLong {
                offset: self.offset,
                length: length as usize,
                remaining: rest.len(),
            });
        }
        self.offset += 2 + payload_len;
        Ok(&rest[..payload_len])
    }
}

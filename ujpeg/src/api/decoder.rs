// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::cell::Cell;

use super::{ChromaMode, ChromaSiting, Decoded, DecoderOptions, PixelFormat, Status};
use crate::{
    color,
    error::{Error, Result},
    image::Plane,
    parser::{DecodeState, Frame},
    upsample,
    util::{tracing_wrappers::*, try_filled},
};

/// A decoding context for one image at a time.
///
/// Every entry point returns a [`Result`]; the outcome of the most recent one
/// is also kept as a [`Status`]. Contexts share nothing, so independent
/// decoders can run on separate threads.
///
/// ```
/// # use ujpeg::api::{Decoder, DecoderOptions};
/// let mut decoder = Decoder::new(DecoderOptions::default());
/// assert!(decoder.decode(b"GIF89a").is_err());
/// assert!(!decoder.is_valid());
/// assert!(decoder.width().is_err());
/// ```
#[derive(Debug, Default)]
pub struct Decoder {
    options: DecoderOptions,
    state: DecodeState,
    raster: Option<(PixelFormat, Vec<u8>)>,
    status: Cell<Status>,
}

impl Decoder {
    pub fn new(options: DecoderOptions) -> Decoder {
        Decoder {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Takes effect from the next call to [`Decoder::decode`].
    pub fn set_skip_pixel_decode(&mut self, skip: bool) {
        self.options.skip_pixel_decode = skip;
        self.status.set(Status::Ok);
    }

    /// Takes effect from the next call to [`Decoder::decode`].
    pub fn set_chroma_mode(&mut self, mode: ChromaMode) {
        self.options.chroma_mode = mode;
        self.status.set(Status::Ok);
    }

    /// Outcome of the most recent operation.
    pub fn status(&self) -> Status {
        self.status.get()
    }

    fn record<T>(&self, result: Result<T>) -> Result<T> {
        self.status.set(match &result {
            Ok(_) => Status::Ok,
            Err(err) => Status::Failed(err.kind()),
        });
        result
    }

    /// Drops the current image and every buffer derived from it. Options are
    /// kept.
    pub fn reset(&mut self) {
        self.state = DecodeState::default();
        self.raster = None;
        self.status.set(Status::Ok);
    }

    /// Decodes a complete JPEG stream held in memory, replacing any previous
    /// image.
    ///
    /// Errors before the scan leave no image behind. Errors inside the
    /// entropy-coded data are reported as [`Decoded::Partial`]: the image is
    /// kept and [`Decoder::status`] records the failure.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, fields(len = data.len())))]
    pub fn decode(&mut self, data: &[u8]) -> Result<Decoded> {
        self.reset();
        let result = match self.state.decode(data, &self.options) {
            Ok(()) if self.state.decoded => Ok(Decoded::Complete),
            Ok(()) => Ok(Decoded::HeadersOnly),
            Err(err) if self.state.decoded => {
                warn!("decoding stopped early: {err}");
                self.status.set(Status::Failed(err.kind()));
                return Ok(Decoded::Partial(err));
            }
            Err(err) => {
                self.state = DecodeState::default();
                Err(err)
            }
        };
        self.record(result)
    }

    /// Whether the last decode got as far as an accepted scan header.
    pub fn is_valid(&self) -> bool {
        self.state.valid
    }

    /// Whether the last decode produced pixels, possibly only partially.
    pub fn is_decoded(&self) -> bool {
        self.state.decoded
    }

    fn frame(&self) -> Result<&Frame> {
        match &self.state.frame {
            Some(frame) if self.state.valid => Ok(frame),
            _ => Err(Error::NotDecoded),
        }
    }

    fn decoded_frame(&self) -> Result<&Frame> {
        if !self.state.decoded {
            return Err(Error::NotDecoded);
        }
        self.frame()
    }

    pub fn width(&self) -> Result<usize> {
        self.record(self.frame().map(|f| f.width))
    }

    pub fn height(&self) -> Result<usize> {
        self.record(self.frame().map(|f| f.height))
    }

    pub fn num_components(&self) -> Result<usize> {
        self.record(self.frame().map(|f| f.components.len()))
    }

    pub fn is_color(&self) -> Result<bool> {
        self.record(self.frame().map(|f| f.components.len() == 3))
    }

    /// Size in bytes of the image in [`PixelFormat::Native`] layout.
    pub fn image_size(&self) -> Result<usize> {
        self.record(
            self.frame()
                .map(|f| f.width * f.height * f.components.len()),
        )
    }

    /// Chroma siting declared by the stream's Exif data; centered if absent.
    pub fn chroma_siting(&self) -> Result<ChromaSiting> {
        self.record(self.frame().map(|_| self.state.chroma_siting))
    }

    /// Returns component plane `index` (0 = Y, 1 = Cb, 2 = Cr).
    ///
    /// Before [`Decoder::upsample_chroma`] the planes keep their coded
    /// resolution and MCU padding.
    pub fn plane(&self, index: usize) -> Result<&Plane> {
        let plane = self.decoded_frame().and_then(|frame| {
            frame
                .components
                .get(index)
                .ok_or(Error::PlaneOutOfRange(index, frame.components.len()))?
                .plane
                .as_ref()
                .ok_or(Error::NotDecoded)
        });
        self.record(plane)
    }

    /// Brings every subsampled plane up to the frame size. Planes already at
    /// full size are left untouched, so calling this repeatedly is cheap.
    pub fn upsample_chroma(&mut self) -> Result<()> {
        let result = self.upsample_planes();
        self.record(result)
    }

    fn upsample_planes(&mut self) -> Result<()> {
        if !self.state.decoded {
            return Err(Error::NotDecoded);
        }
        let frame = self.state.frame.as_mut().ok_or(Error::NotDecoded)?;
        let size = (frame.width, frame.height);
        for (i, c) in frame.components.iter_mut().enumerate() {
            let plane = c.plane.as_mut().ok_or(Error::NotDecoded)?;
            upsample::upsample_plane(
                plane,
                i,
                size,
                self.options.chroma_mode,
                self.state.chroma_siting,
            )?;
        }
        Ok(())
    }

    /// Number of bytes [`Decoder::image`] produces for `format`.
    pub fn image_len(&self, format: PixelFormat) -> Result<usize> {
        self.record(self.raster_len(format))
    }

    fn raster_len(&self, format: PixelFormat) -> Result<usize> {
        let frame = self.decoded_frame()?;
        let bpp = format.bytes_per_pixel(frame.components.len() == 3);
        Ok(frame.width * frame.height * bpp)
    }

    fn render_into(&mut self, format: PixelFormat, out: &mut [u8]) -> Result<()> {
        self.upsample_planes()?;
        let frame = self.decoded_frame()?;
        let planes = frame
            .components
            .iter()
            .map(|c| c.plane.as_ref().ok_or(Error::NotDecoded))
            .collect::<Result<Vec<_>>>()?;
        color::convert(&planes, (frame.width, frame.height), format, out)
    }

    fn render(&mut self, format: PixelFormat) -> Result<Vec<u8>> {
        let mut out = try_filled(self.raster_len(format)?, 0u8)?;
        self.render_into(format, &mut out)?;
        Ok(out)
    }

    /// Returns the decoded image as interleaved `format` pixels, upsampling
    /// chroma first if needed. The buffer is cached until the next decode or
    /// reset.
    pub fn image(&mut self, format: PixelFormat) -> Result<&[u8]> {
        let raster = match self.raster.take() {
            Some((cached, buf)) if cached == format => Ok(buf),
            _ => self.render(format),
        };
        let raster = self.record(raster)?;
        Ok(&self.raster.insert((format, raster)).1)
    }

    /// Like [`Decoder::image`], but writes into `dest` and returns the number
    /// of bytes written.
    pub fn image_into(&mut self, format: PixelFormat, dest: &mut [u8]) -> Result<usize> {
        let result = self.copy_image(format, dest);
        self.record(result)
    }

    fn copy_image(&mut self, format: PixelFormat, dest: &mut [u8]) -> Result<usize> {
        let len = self.raster_len(format)?;
        let available = dest.len();
        let dest = dest
            .get_mut(..len)
            .ok_or(Error::BufferTooSmall(available, len))?;
        match &self.raster {
            Some((cached, buf)) if *cached == format => dest.copy_from_slice(buf),
            _ => self.render_into(format, dest)?,
        }
        Ok(len)
    }
}

// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::{
    api::PixelFormat,
    error::{Error, Result},
    image::Plane,
    util::clip,
};

/// Fixed-point (8 fractional bits) JFIF YCbCr to RGB conversion.
#[inline(always)]
pub(crate) fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y = (y as i32) << 8;
    let cb = cb as i32 - 128;
    let cr = cr as i32 - 128;
    [
        clip((y + 359 * cr + 128) >> 8),
        clip((y - 88 * cb - 183 * cr + 128) >> 8),
        clip((y + 454 * cb + 128) >> 8),
    ]
}

/// Writes the `width x height` image held by `planes` to `out` as tightly
/// packed pixels of `format`. Every plane must be at least image-sized.
pub(crate) fn convert(
    planes: &[&Plane],
    (width, height): (usize, usize),
    format: PixelFormat,
    out: &mut [u8],
) -> Result<()> {
    let bpp = format.bytes_per_pixel(planes.len() == 3);
    let out_rows = out.chunks_exact_mut(width * bpp).take(height);
    match *planes {
        [gray] => {
            for (y, out_row) in out_rows.enumerate() {
                let row = &gray.row(y)[..width];
                match format {
                    PixelFormat::Native => out_row.copy_from_slice(row),
                    PixelFormat::Rgb8 | PixelFormat::Rgba8 => {
                        for (px, &v) in out_row.chunks_exact_mut(bpp).zip(row) {
                            px[..3].fill(v);
                            if bpp == 4 {
                                px[3] = 255;
                            }
                        }
                    }
                }
            }
        }
        [luma, cb, cr] => {
            for (y, out_row) in out_rows.enumerate() {
                let rows = (luma.row(y), cb.row(y), cr.row(y));
                for (x, px) in out_row.chunks_exact_mut(bpp).enumerate() {
                    px[..3].copy_from_slice(&ycbcr_to_rgb(rows.0[x], rows.1[x], rows.2[x]));
                    if bpp == 4 {
                        px[3] = 255;
                    }
                }
            }
        }
        _ => return Err(Error::UnsupportedComponentCount(planes.len() as u8)),
    }
    Ok(())
}

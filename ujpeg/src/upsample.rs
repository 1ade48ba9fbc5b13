// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Display;

use num_derive::FromPrimitive;

use crate::{
    api::ChromaMode,
    error::{Error, Result},
    image::Plane,
    util::{clip, tracing_wrappers::*, try_filled},
};

/// Where subsampled chroma samples sit relative to luma, as declared by the
/// Exif YCbCrPositioning tag.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive)]
pub enum ChromaSiting {
    /// Chroma samples sit between the luma samples they cover.
    #[default]
    Centered = 1,
    /// Chroma samples coincide with the top-left luma sample.
    CoSited = 2,
}

impl Display for ChromaSiting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChromaSiting::Centered => write!(f, "centered"),
            ChromaSiting::CoSited => write!(f, "co-sited"),
        }
    }
}

// Centered taps, 1/128 units.
const CF4A: i32 = -9;
const CF4B: i32 = 111;
const CF4C: i32 = 29;
const CF4D: i32 = -3;
const CF3A: i32 = 28;
const CF3B: i32 = 109;
const CF3C: i32 = -9;
const CF3X: i32 = 104;
const CF3Y: i32 = 27;
const CF3Z: i32 = -3;
const CF2A: i32 = 139;
const CF2B: i32 = -11;

#[inline(always)]
fn cf(x: i32) -> u8 {
    clip((x + 64) >> 7)
}

// Co-sited taps are in 1/16 units.
#[inline(always)]
fn sf(x: i32) -> u8 {
    clip((x + 8) >> 4)
}

/// Doubles one line of `n >= 3` samples, with chroma centered between luma.
fn centered_line(n: usize, src: impl Fn(usize) -> i32, mut dst: impl FnMut(usize, u8)) {
    dst(0, cf(CF2A * src(0) + CF2B * src(1)));
    dst(1, cf(CF3X * src(0) + CF3Y * src(1) + CF3Z * src(2)));
    dst(2, cf(CF3A * src(0) + CF3B * src(1) + CF3C * src(2)));
    for x in 0..n - 3 {
        let (a, b, c, d) = (src(x), src(x + 1), src(x + 2), src(x + 3));
        dst(2 * x + 3, cf(CF4A * a + CF4B * b + CF4C * c + CF4D * d));
        dst(2 * x + 4, cf(CF4D * a + CF4C * b + CF4B * c + CF4A * d));
    }
    let m = 2 * n;
    let (a, b, c) = (src(n - 1), src(n - 2), src(n - 3));
    dst(m - 3, cf(CF3A * a + CF3B * b + CF3C * c));
    dst(m - 2, cf(CF3X * a + CF3Y * b + CF3Z * c));
    dst(m - 1, cf(CF2A * a + CF2B * b));
}

/// Doubles one line of `n >= 3` samples, with chroma co-sited with even luma
/// samples: those are copied, odd ones interpolated.
fn co_sited_line(n: usize, src: impl Fn(usize) -> i32, mut dst: impl FnMut(usize, u8)) {
    dst(0, clip(src(0)));
    dst(1, sf(8 * src(0) + 9 * src(1) - src(2)));
    dst(2, clip(src(1)));
    for x in 2..n - 1 {
        dst(
            2 * x - 1,
            sf(9 * (src(x - 1) + src(x)) - (src(x - 2) + src(x + 1))),
        );
        dst(2 * x, clip(src(x)));
    }
    let m = 2 * n;
    let (a, b, c) = (src(n - 1), src(n - 2), src(n - 3));
    dst(m - 3, sf(8 * a + 9 * b - c));
    dst(m - 2, clip(a));
    dst(m - 1, sf(17 * a - b));
}

type LineFilter = fn(usize, &dyn Fn(usize) -> i32, &mut dyn FnMut(usize, u8));

fn line_filter(siting: ChromaSiting) -> LineFilter {
    match siting {
        ChromaSiting::Centered => |n, src, dst| centered_line(n, src, dst),
        ChromaSiting::CoSited => |n, src, dst| co_sited_line(n, src, dst),
    }
}

/// The line filters need three taps along the axis being doubled.
fn check_filterable(plane: &Plane, len: usize) -> Result<()> {
    if len < 3 {
        return Err(Error::PlaneTooSmall(0, plane.width(), plane.height()));
    }
    Ok(())
}

/// Doubles the width of `plane`.
pub(crate) fn upsample_horizontal(plane: &Plane, siting: ChromaSiting) -> Result<Plane> {
    check_filterable(plane, plane.width())?;
    let (w, h) = plane.size();
    let filter = line_filter(siting);
    let mut out = try_filled(2 * w * h, 0u8)?;
    for (y, out_row) in out.chunks_exact_mut(2 * w).enumerate() {
        let row = plane.row(y);
        filter(w, &|x: usize| row[x] as i32, &mut |x: usize, v: u8| {
            out_row[x] = v
        });
    }
    Ok(Plane::from_packed(2 * w, h, out))
}

/// Doubles the height of `plane`.
pub(crate) fn upsample_vertical(plane: &Plane, siting: ChromaSiting) -> Result<Plane> {
    check_filterable(plane, plane.height())?;
    let (w, h) = plane.size();
    let filter = line_filter(siting);
    let mut out = try_filled(w * 2 * h, 0u8)?;
    for x in 0..w {
        filter(h, &|y: usize| plane.row(y)[x] as i32, &mut |y: usize, v: u8| {
            out[y * w + x] = v
        });
    }
    Ok(Plane::from_packed(w, 2 * h, out))
}

/// Nearest-neighbour upsampling by the smallest power-of-two factors that
/// reach `width x height`.
pub(crate) fn upsample_nearest(plane: &Plane, width: usize, height: usize) -> Result<Plane> {
    let (w, h) = plane.size();
    let mut xshift = 0;
    while (w << xshift) < width {
        xshift += 1;
    }
    let mut yshift = 0;
    while (h << yshift) < height {
        yshift += 1;
    }
    let (out_w, out_h) = (w << xshift, h << yshift);
    let mut out = try_filled(out_w * out_h, 0u8)?;
    for (y, out_row) in out.chunks_exact_mut(out_w).enumerate() {
        let row = plane.row(y >> yshift);
        for (x, v) in out_row.iter_mut().enumerate() {
            *v = row[x >> xshift];
        }
    }
    Ok(Plane::from_packed(out_w, out_h, out))
}

/// Brings `plane` (component `index`) up to `width x height`. Planes that are
/// already large enough are left alone.
pub(crate) fn upsample_plane(
    plane: &mut Plane,
    index: usize,
    (width, height): (usize, usize),
    mode: ChromaMode,
    siting: ChromaSiting,
) -> Result<()> {
    if plane.width() >= width && plane.height() >= height {
        return Ok(());
    }
    debug!(
        "upsampling plane {index} from {}x{} to {width}x{height} ({mode:?}, {siting})",
        plane.width(),
        plane.height()
    );
    match mode {
        ChromaMode::Fast => *plane = upsample_nearest(plane, width, height)?,
        ChromaMode::Accurate => {
            while plane.width() < width || plane.height() < height {
                if plane.width() < width {
                    *plane = upsample_horizontal(plane, siting)
                        .map_err(|e| plane_index(e, index))?;
                }
                if plane.height() < height {
                    *plane =
                        upsample_vertical(plane, siting).map_err(|e| plane_index(e, index))?;
                }
            }
        }
    }
    if plane.width() < width || plane.height() < height {
        return Err(Error::UpsampleIncomplete(index));
    }
    Ok(())
}

fn plane_index(err: Error, index: usize) -> Error {
    match err {
        Error::PlaneTooSmall(_, w, h) => Error::PlaneTooSmall(index, w, h),
        e => e,
    }
}

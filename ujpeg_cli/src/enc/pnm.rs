// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io::Write;

use color_eyre::eyre::{Result, eyre};

use crate::dec::DecodeOutput;

/// Binary PGM for grayscale images, PPM for color ones.
pub fn to_pnm(image: &DecodeOutput) -> Result<Vec<u8>> {
    let magic = match image.channels {
        1 => "P5",
        3 => "P6",
        n => return Err(eyre!("Cannot write {n} channels as PNM")),
    };
    let (width, height) = image.info.size;
    let mut ret = vec![];
    write!(&mut ret, "{magic}\n{width} {height}\n255\n")?;
    ret.extend_from_slice(&image.pixels);
    Ok(ret)
}

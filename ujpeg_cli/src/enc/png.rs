// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io::Write;

use color_eyre::eyre::{Result, eyre};

use crate::dec::DecodeOutput;

fn png_color(num_channels: usize) -> Result<png::ColorType> {
    match num_channels {
        1 => Ok(png::ColorType::Grayscale),
        3 => Ok(png::ColorType::Rgb),
        4 => Ok(png::ColorType::Rgba),
        _ => Err(eyre!(
            "Invalid number of channels for PNG output {:?}",
            num_channels
        )),
    }
}

pub fn to_png<Writer: Write>(image: &DecodeOutput, buf: &mut Writer) -> Result<()> {
    let (width, height) = image.info.size;
    let mut info = png::Info::with_size(width as u32, height as u32);
    if image.info.num_components == 3 {
        info.srgb = Some(png::SrgbRenderingIntent::Perceptual);
    }
    let mut encoder = png::Encoder::with_info(buf, info)?;
    encoder.set_color(png_color(image.channels)?);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Fast);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.pixels)?;
    writer.finish()?;
    Ok(())
}

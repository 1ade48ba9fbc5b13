// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ujpeg::ChromaMode;
use ujpeg_cli::{dec, enc};

#[derive(Parser)]
#[command(about = "Decodes baseline JPEG images")]
struct Opt {
    /// Input JPEG file
    input: PathBuf,

    /// Output image file, should end in .png, .pgm or .ppm
    output: Option<PathBuf>,

    /// Replicate chroma samples instead of filtering them
    #[clap(long)]
    fast_chroma: bool,

    /// Only print the image geometry
    #[clap(long)]
    info: bool,

    /// Write PNG output with an alpha channel
    #[clap(long)]
    rgba: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    #[cfg(feature = "tracing-subscriber")]
    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(EnvFilter::from_default_env())
            .init();
    }

    let opt = Opt::parse();
    let data = fs::read(&opt.input)
        .wrap_err_with(|| format!("Cannot read {}", opt.input.display()))?;

    if opt.info {
        let info = dec::probe(&data)?;
        println!(
            "{}x{}, {} components, {} chroma siting",
            info.size.0, info.size.1, info.num_components, info.chroma_siting
        );
        return Ok(());
    }

    let chroma_mode = if opt.fast_chroma {
        ChromaMode::Fast
    } else {
        ChromaMode::Accurate
    };
    let (image, duration) = dec::decode(&data, chroma_mode, opt.rgba)?;
    println!(
        "Decoded {}x{} image with {} components in {:.2} ms",
        image.info.size.0,
        image.info.size.1,
        image.info.num_components,
        duration.as_secs_f64() * 1000.0
    );
    if let Some(err) = &image.warning {
        eprintln!("Warning: image is incomplete: {err}");
    }

    let Some(output) = opt.output else {
        return Ok(());
    };
    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let bytes = match extension.as_deref() {
        Some("png") => {
            let mut buf = vec![];
            enc::png::to_png(&image, &mut buf)?;
            buf
        }
        Some("pgm") if image.channels == 1 => enc::pnm::to_pnm(&image)?,
        Some("ppm") if image.channels == 3 => enc::pnm::to_pnm(&image)?,
        _ => {
            return Err(eyre!(
                "Output format not supported for {} channels: {}",
                image.channels,
                output.display()
            ));
        }
    };
    fs::write(&output, bytes).wrap_err_with(|| format!("Cannot write {}", output.display()))
}

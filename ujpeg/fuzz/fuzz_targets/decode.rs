// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
#![no_main]

use libfuzzer_sys::fuzz_target;
use ujpeg::{ChromaMode, Decoded, Decoder, DecoderOptions, PixelFormat};

fuzz_target!(|data: &[u8]| {
    // The first byte picks the options so both upsamplers get coverage.
    let Some((&mode, data)) = data.split_first() else {
        return;
    };
    let options = DecoderOptions {
        chroma_mode: if mode & 1 == 0 {
            ChromaMode::Accurate
        } else {
            ChromaMode::Fast
        },
        pixel_limit: Some(1 << 22),
        ..Default::default()
    };
    let mut decoder = Decoder::new(options);
    if let Ok(Decoded::Complete | Decoded::Partial(_)) = decoder.decode(data) {
        let _ = decoder.image(PixelFormat::Rgba8);
    }
});

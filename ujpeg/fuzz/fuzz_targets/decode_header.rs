// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
#![no_main]

use libfuzzer_sys::fuzz_target;
use ujpeg::{Decoder, DecoderOptions};

fuzz_target!(|data: &[u8]| {
    let mut decoder = Decoder::new(DecoderOptions {
        skip_pixel_decode: true,
        ..Default::default()
    });
    if decoder.decode(data).is_ok() {
        let _ = (decoder.width(), decoder.height(), decoder.num_components());
    }
});

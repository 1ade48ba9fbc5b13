// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ujpeg::idct::idct_8x8;

fn idct_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("idct_8x8");
    let mut dense = [0i32; 64];
    for (i, v) in dense.iter_mut().enumerate() {
        *v = (i as i32 * 37 % 61) - 30;
    }
    let mut dc_only = [0i32; 64];
    dc_only[0] = 120;

    for (name, coeffs) in [("dc_only", dc_only), ("dense", dense)] {
        let mut out = [0u8; 64];
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                let mut block = coeffs;
                idct_8x8(&mut block, &mut out, 8);
                out[0]
            })
        });
    }
    group.finish();
}

criterion_group!(benches, idct_benches);
criterion_main!(benches);

// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! End-to-end decoding of synthetic baseline streams.

use std::f64::consts::PI;

use ujpeg::{
    ChromaMode, ChromaSiting, Decoded, Decoder, DecoderOptions, Error, ErrorKind, PixelFormat,
    Status, quant::ZIGZAG,
};
use ujpeg_test_utils::{Block, JpegBuilder, assert_almost_eq, exif_ycbcr_positioning, flat_sample};

fn decode(data: &[u8]) -> Decoder {
    let mut decoder = Decoder::default();
    assert_eq!(decoder.decode(data), Ok(Decoded::Complete));
    decoder
}

#[test]
fn rejects_other_formats() {
    let mut decoder = Decoder::default();
    assert_eq!(
        decoder.decode(b"\x89PNG\r\n\x1a\n"),
        Err(Error::InvalidSignature(0x89, 0x50))
    );
    assert_eq!(decoder.decode(&[0xff]), Err(Error::MissingSignature));
    assert_eq!(decoder.decode(&[0xff, 0xd8, 0xff, 0xd9]), Err(Error::MissingScan));
}

#[test]
fn flat_blocks_fill_their_area() {
    let dcs = [-200, -17, 0, 3, 64, 200];
    let jpeg = JpegBuilder::grayscale(48, 8)
        .quant(3)
        .mcus(dcs.iter().map(|&dc| vec![Block::flat(dc)]))
        .build();
    let mut decoder = decode(&jpeg.data);
    let image = decoder.image(PixelFormat::Native).unwrap();
    for row in image.chunks_exact(48) {
        for (block, &dc) in row.chunks_exact(8).zip(dcs.iter()) {
            assert!(block.iter().all(|&v| v == flat_sample(dc, 3)), "dc {dc}");
        }
    }
}

#[test]
fn partial_edge_blocks_are_cropped() {
    let jpeg = JpegBuilder::grayscale(13, 5)
        .mcus((0..2).map(|i| vec![Block::flat(40 * i)]))
        .build();
    let mut decoder = decode(&jpeg.data);
    assert_eq!(decoder.image_len(PixelFormat::Native), Ok(13 * 5));
    let image = decoder.image(PixelFormat::Native).unwrap();
    assert_eq!(image.len(), 65);
    assert_eq!(image[12], flat_sample(40, 1));
    assert_eq!(image[64], flat_sample(40, 1));
}

#[test]
fn matches_reference_idct() {
    let ac = [(1, 12), (2, -7), (3, 5), (4, 9), (5, -3), (6, 2)];
    let q = 2;
    let jpeg = JpegBuilder::grayscale(8, 8)
        .quant(q)
        .mcu(vec![Block::with_ac(-30, &ac)])
        .build();
    let mut decoder = decode(&jpeg.data);

    let mut coeffs = [0.0f64; 64];
    coeffs[0] = -30.0 * q as f64;
    for (k, v) in ac {
        coeffs[ZIGZAG[k] as usize] = (v * q as i32) as f64;
    }
    let c = |u: usize| if u == 0 { 1.0 / 2f64.sqrt() } else { 1.0 };
    let image = decoder.image(PixelFormat::Native).unwrap();
    for y in 0..8 {
        for x in 0..8 {
            let mut sum = 0.0;
            for v in 0..8 {
                for u in 0..8 {
                    sum += c(u)
                        * c(v)
                        * coeffs[v * 8 + u]
                        * ((2 * x + 1) as f64 * u as f64 * PI / 16.0).cos()
                        * ((2 * y + 1) as f64 * v as f64 * PI / 16.0).cos();
                }
            }
            let want = (sum / 4.0 + 128.0).clamp(0.0, 255.0);
            assert_almost_eq!(image[y * 8 + x] as f64, want, 2.0);
        }
    }
}

#[test]
fn restart_intervals_reset_prediction() {
    let dcs: Vec<i32> = (0..9).map(|i| i * 10 - 40).collect();
    let jpeg = JpegBuilder::grayscale(24, 24)
        .restart_interval(2)
        .mcus(dcs.iter().map(|&dc| vec![Block::flat(dc)]))
        .build();
    assert_eq!(jpeg.restart_markers, 4);
    let mut decoder = decode(&jpeg.data);
    let image = decoder.image(PixelFormat::Native).unwrap();
    for (i, &dc) in dcs.iter().enumerate() {
        let (x, y) = (i % 3 * 8, i / 3 * 8);
        assert_eq!(image[y * 24 + x], flat_sample(dc, 1), "MCU {i}");
    }
}

#[test]
fn restart_mismatch_is_reported() {
    let jpeg = JpegBuilder::grayscale(32, 8)
        .restart_interval(1)
        .mcus((0..4).map(|i| vec![Block::flat(20 * i)]))
        .wrong_restart_marker(2, 0xd3)
        .build();
    let mut decoder = Decoder::default();
    let result = decoder.decode(&jpeg.data);
    assert_eq!(
        result,
        Ok(Decoded::Partial(Error::RestartMismatch {
            expected: 2,
            found: 0xffd3
        }))
    );
    let image = decoder.image(PixelFormat::Native).unwrap();
    assert_eq!(image[8], flat_sample(20, 1));
    assert_eq!(image[16], flat_sample(40, 1));
    assert_eq!(image[24], 0x80);
}

#[test]
fn truncated_scan_keeps_decoded_prefix() {
    // Every MCU codes a DC difference of 64 in 13 bits.
    let jpeg = JpegBuilder::grayscale(32, 8)
        .mcus((1..=4).map(|i| vec![Block::flat(64 * i)]))
        .build();
    let truncated = &jpeg.data[..jpeg.scan_offset + 4];
    let mut decoder = Decoder::default();
    let err = match decoder.decode(truncated) {
        Ok(Decoded::Partial(err)) => err,
        other => panic!("unexpected result {other:?}"),
    };
    assert_eq!(err.kind(), ErrorKind::HuffmanCorruption);
    let row: Vec<u8> = decoder
        .image(PixelFormat::Native)
        .unwrap()
        .iter()
        .step_by(8)
        .take(4)
        .copied()
        .collect();
    assert_eq!(row, [136, 144, 0x80, 0x80]);
}

#[test]
fn marker_inside_scan_is_stream_corruption() {
    let jpeg = JpegBuilder::grayscale(16, 8)
        .mcus((0..2).map(|_| vec![Block::flat(10)]))
        .build();
    let mut data = jpeg.data.clone();
    data.splice(jpeg.scan_offset..jpeg.scan_offset, [0xff, 0xc4]);
    let mut decoder = Decoder::default();
    assert_eq!(
        decoder.decode(&data),
        Ok(Decoded::Partial(Error::InvalidEscape(0xc4)))
    );
    assert_eq!(decoder.status(), Status::Failed(ErrorKind::HuffmanCorruption));
    assert!(decoder.image(PixelFormat::Native).unwrap().iter().all(|&v| v == 0x80));
}

fn color_420(luma: [i32; 4], cb: i32, cr: i32) -> JpegBuilder {
    let mcu = luma
        .into_iter()
        .chain([cb, cr])
        .map(Block::flat)
        .collect();
    JpegBuilder::ycbcr(16, 16, (2, 2)).mcu(mcu)
}

fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let (y, cb, cr) = ((y as i32) << 8, cb as i32 - 128, cr as i32 - 128);
    let clip = |v: i32| ((v + 128) >> 8).clamp(0, 255) as u8;
    [
        clip(y + 359 * cr),
        clip(y - 88 * cb - 183 * cr),
        clip(y + 454 * cb),
    ]
}

#[test]
fn subsampled_color() {
    let jpeg = color_420([10, 10, 10, 10], -40, 60).build();
    let mut decoder = decode(&jpeg.data);
    assert_eq!(decoder.plane(1).map(|p| p.size()), Ok((8, 8)));
    let expected = ycbcr_to_rgb(flat_sample(10, 1), flat_sample(-40, 1), flat_sample(60, 1));
    let rgb = decoder.image(PixelFormat::Native).unwrap();
    assert_eq!(rgb.len(), 16 * 16 * 3);
    for pixel in rgb.chunks_exact(3) {
        assert_eq!(pixel, expected);
    }
}

#[test]
fn short_422_image() {
    let jpeg = JpegBuilder::ycbcr(32, 2, (2, 1))
        .mcus((0..2).map(|_| {
            vec![
                Block::flat(20),
                Block::flat(20),
                Block::flat(-30),
                Block::flat(45),
            ]
        }))
        .build();
    let mut decoder = decode(&jpeg.data);
    assert_eq!(decoder.plane(1).map(|p| p.size()), Ok((16, 2)));
    let expected = ycbcr_to_rgb(flat_sample(20, 1), flat_sample(-30, 1), flat_sample(45, 1));
    let rgb = decoder.image(PixelFormat::Rgb8).unwrap();
    assert_eq!(rgb.len(), 32 * 2 * 3);
    for pixel in rgb.chunks_exact(3) {
        assert_eq!(pixel, expected);
    }
    assert_eq!(decoder.plane(1).map(|p| p.size()), Ok((32, 2)));
}

#[test]
fn fast_and_accurate_agree_on_flat_chroma() {
    let jpeg = color_420([0, 30, -30, 60], 25, -25).build();
    let accurate = decode(&jpeg.data).image(PixelFormat::Rgb8).unwrap().to_vec();
    let mut fast = Decoder::new(DecoderOptions {
        chroma_mode: ChromaMode::Fast,
        ..Default::default()
    });
    fast.decode(&jpeg.data).unwrap();
    assert_eq!(fast.image(PixelFormat::Rgb8).unwrap(), accurate);
}

#[test]
fn upsampling_is_idempotent() {
    let jpeg = JpegBuilder::ycbcr(24, 16, (2, 1))
        .mcus((0..3).map(|i| {
            vec![
                Block::flat(0),
                Block::flat(0),
                Block::with_ac(10 * i, &[(1, 8), (2, -6)]),
                Block::flat(-10 * i),
            ]
        }))
        .build();
    let mut decoder = decode(&jpeg.data);
    decoder.upsample_chroma().unwrap();
    let once = decoder.plane(1).unwrap().clone();
    assert_eq!(once.size(), (24, 16));
    decoder.upsample_chroma().unwrap();
    assert_eq!(decoder.plane(1).unwrap(), &once);
}

#[test]
fn exif_selects_co_sited_filter() {
    let build = |exif: Option<u16>| {
        let builder = JpegBuilder::ycbcr(32, 8, (2, 1)).mcus((0..2).map(|i| {
            vec![
                Block::flat(0),
                Block::flat(0),
                Block::with_ac(40 * i - 20, &[(1, 20)]),
                Block::flat(0),
            ]
        }));
        match exif {
            Some(value) => builder.exif(exif_ycbcr_positioning(value)),
            None => builder,
        }
        .build()
    };

    let mut centered = decode(&build(None).data);
    let mut explicit = decode(&build(Some(1)).data);
    let mut co_sited = decode(&build(Some(2)).data);
    assert_eq!(centered.chroma_siting(), Ok(ChromaSiting::Centered));
    assert_eq!(explicit.chroma_siting(), Ok(ChromaSiting::Centered));
    assert_eq!(co_sited.chroma_siting(), Ok(ChromaSiting::CoSited));

    centered.upsample_chroma().unwrap();
    explicit.upsample_chroma().unwrap();
    co_sited.upsample_chroma().unwrap();
    assert_eq!(centered.plane(1), explicit.plane(1));
    assert_ne!(centered.plane(1), co_sited.plane(1));
}

#[test]
fn decoders_are_independent() {
    let gray = JpegBuilder::grayscale(8, 8).mcu(vec![Block::flat(50)]).build();
    let color = color_420([0; 4], 10, 10).build();
    let handles: Vec<_> = [gray.data, color.data]
        .into_iter()
        .map(|data| {
            std::thread::spawn(move || {
                let mut decoder = decode(&data);
                decoder.image(PixelFormat::Native).unwrap().len()
            })
        })
        .collect();
    let lens: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(lens, [64, 16 * 16 * 3]);
}

#[test]
fn mutated_streams_never_panic() {
    let base = color_420([5, -5, 15, -15], 30, -30)
        .exif(exif_ycbcr_positioning(2))
        .restart_interval(1)
        .build()
        .data;
    let options = DecoderOptions {
        pixel_limit: Some(1 << 20),
        ..Default::default()
    };
    arbtest::arbtest(|u| {
        let mut data = base.clone();
        for _ in 0..u.int_in_range(1..=8)? {
            let i = u.choose_index(data.len())?;
            data[i] = u.arbitrary()?;
        }
        let cut = u.int_in_range(0..=data.len())?;
        data.truncate(cut);

        let mut decoder = Decoder::new(options.clone());
        if let Ok(Decoded::Complete | Decoded::Partial(_)) = decoder.decode(&data) {
            let _ = decoder.image(PixelFormat::Rgba8);
        }
        Ok(())
    })
    .budget_ms(2000);
}

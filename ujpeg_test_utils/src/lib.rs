// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

#[macro_export]
macro_rules! assert_almost_eq {
    ($left:expr, $right:expr, $max_error:expr $(,)?) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                let diff = if *left_val > *right_val {
                    *left_val - *right_val
                } else {
                    *right_val - *left_val
                };
                if !(diff <= $max_error) {
                    panic!(
                        "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n max_error: `{:?}`",
                        left_val, right_val, $max_error
                    );
                }
            }
        }
    };
}

/// DC table used by [`JpegBuilder`]: categories 0 to 11, every code 4 bits
/// long, so category `n` is coded as `n`.
pub const DC_COUNTS: [u8; 16] = [0, 0, 0, 12, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
pub const DC_SYMBOLS: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// AC table used by [`JpegBuilder`]: end-of-block is "00", every other symbol
/// has a 5-bit code.
pub const AC_COUNTS: [u8; 16] = [0, 1, 0, 0, 17, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
pub const AC_SYMBOLS: [u8; 18] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x11, 0x12, 0x21, 0x22,
    0x31, 0x32, 0xf0,
];

/// One 8x8 block of quantized coefficients.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    /// Absolute DC value; the builder codes the difference to the predictor.
    pub dc: i32,
    /// `(zigzag index, value)` pairs, indices in 1..=63.
    pub ac: Vec<(usize, i32)>,
}

impl Block {
    pub fn flat(dc: i32) -> Block {
        Block { dc, ac: vec![] }
    }

    pub fn with_ac(dc: i32, ac: &[(usize, i32)]) -> Block {
        Block { dc, ac: ac.to_vec() }
    }
}

/// Sample value a decoder must produce for every pixel of `Block::flat(dc)`
/// quantized with `q`.
pub fn flat_sample(dc: i32, q: u8) -> u8 {
    let coeff = dc * q as i32;
    (((coeff << 3) + 32 >> 6) + 128).clamp(0, 255) as u8
}

/// An APP1 payload with a little-endian Exif IFD0 holding only the
/// YCbCrPositioning tag.
pub fn exif_ycbcr_positioning(value: u16) -> Vec<u8> {
    let mut out = b"Exif\0\0II*\0".to_vec();
    out.extend_from_slice(&8u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&0x0213u16.to_le_bytes());
    out.extend_from_slice(&3u16.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&value.to_le_bytes());
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(&0u32.to_le_bytes());
    out
}

/// A baseline stream produced by [`JpegBuilder::build`].
#[derive(Clone, Debug)]
pub struct Encoded {
    pub data: Vec<u8>,
    /// Offset of the first entropy-coded byte.
    pub scan_offset: usize,
    pub restart_markers: usize,
}

/// Encodes synthetic baseline JPEG streams from explicit coefficients.
#[derive(Clone, Debug)]
pub struct JpegBuilder {
    width: u16,
    height: u16,
    sampling: Vec<(u8, u8)>,
    quant: u8,
    restart_interval: u16,
    mcus: Vec<Vec<Block>>,
    wrong_restart: Option<(usize, u8)>,
    segments: Vec<(u8, Vec<u8>)>,
}

impl JpegBuilder {
    fn new(width: u16, height: u16, sampling: Vec<(u8, u8)>) -> JpegBuilder {
        JpegBuilder {
            width,
            height,
            sampling,
            quant: 1,
            restart_interval: 0,
            mcus: vec![],
            wrong_restart: None,
            segments: vec![],
        }
    }

    pub fn grayscale(width: u16, height: u16) -> JpegBuilder {
        JpegBuilder::new(width, height, vec![(1, 1)])
    }

    /// Three components; chroma is sampled once per MCU.
    pub fn ycbcr(width: u16, height: u16, luma_sampling: (u8, u8)) -> JpegBuilder {
        JpegBuilder::new(width, height, vec![luma_sampling, (1, 1), (1, 1)])
    }

    /// Every quantization table entry.
    pub fn quant(mut self, q: u8) -> JpegBuilder {
        self.quant = q;
        self
    }

    pub fn restart_interval(mut self, interval: u16) -> JpegBuilder {
        self.restart_interval = interval;
        self
    }

    /// Appends one MCU: the blocks of every component in scan order.
    pub fn mcu(mut self, blocks: Vec<Block>) -> JpegBuilder {
        assert_eq!(blocks.len(), self.blocks_per_mcu());
        self.mcus.push(blocks);
        self
    }

    pub fn mcus(self, mcus: impl IntoIterator<Item = Vec<Block>>) -> JpegBuilder {
        mcus.into_iter().fold(self, |b, mcu| b.mcu(mcu))
    }

    /// Replaces the second byte of restart marker `index` with `code`.
    pub fn wrong_restart_marker(mut self, index: usize, code: u8) -> JpegBuilder {
        self.wrong_restart = Some((index, code));
        self
    }

    pub fn exif(self, payload: Vec<u8>) -> JpegBuilder {
        self.segment(0xe1, payload)
    }

    /// Adds a marker segment before the frame header.
    pub fn segment(mut self, marker: u8, payload: Vec<u8>) -> JpegBuilder {
        self.segments.push((marker, payload));
        self
    }

    fn effective_sampling(&self) -> Vec<(usize, usize)> {
        if self.sampling.len() == 1 {
            return vec![(1, 1)];
        }
        self.sampling
            .iter()
            .map(|&(h, v)| (h as usize, v as usize))
            .collect()
    }

    pub fn blocks_per_mcu(&self) -> usize {
        self.effective_sampling().iter().map(|(h, v)| h * v).sum()
    }

    pub fn mcu_count(&self) -> usize {
        let sampling = self.effective_sampling();
        let hmax = sampling.iter().map(|s| s.0).max().unwrap_or(1);
        let vmax = sampling.iter().map(|s| s.1).max().unwrap_or(1);
        (self.width as usize).div_ceil(8 * hmax) * (self.height as usize).div_ceil(8 * vmax)
    }

    pub fn build(&self) -> Encoded {
        let mut out = vec![0xff, 0xd8];
        for (marker, payload) in &self.segments {
            put_segment(&mut out, *marker, payload);
        }

        let mut dqt = vec![0x00];
        dqt.extend_from_slice(&[self.quant; 64]);
        put_segment(&mut out, 0xdb, &dqt);

        let mut sof = vec![8];
        sof.extend_from_slice(&self.height.to_be_bytes());
        sof.extend_from_slice(&self.width.to_be_bytes());
        sof.push(self.sampling.len() as u8);
        for (i, &(h, v)) in self.sampling.iter().enumerate() {
            sof.extend_from_slice(&[i as u8 + 1, (h << 4) | v, 0]);
        }
        put_segment(&mut out, 0xc0, &sof);

        let mut dht = vec![0x00];
        dht.extend_from_slice(&DC_COUNTS);
        dht.extend_from_slice(&DC_SYMBOLS);
        dht.push(0x10);
        dht.extend_from_slice(&AC_COUNTS);
        dht.extend_from_slice(&AC_SYMBOLS);
        put_segment(&mut out, 0xc4, &dht);

        if self.restart_interval > 0 {
            put_segment(&mut out, 0xdd, &self.restart_interval.to_be_bytes());
        }

        let mut sos = vec![self.sampling.len() as u8];
        for i in 0..self.sampling.len() {
            sos.extend_from_slice(&[i as u8 + 1, 0x00]);
        }
        sos.extend_from_slice(&[0, 63, 0]);
        put_segment(&mut out, 0xda, &sos);
        let scan_offset = out.len();

        let dc_codes = canonical_codes(&DC_COUNTS, &DC_SYMBOLS);
        let ac_codes = canonical_codes(&AC_COUNTS, &AC_SYMBOLS);
        let sampling = self.effective_sampling();
        let mut writer = BitWriter { out, acc: 0, nbits: 0 };
        let mut preds = vec![0; sampling.len()];
        let mut restart_markers = 0;
        let total = self.mcu_count();
        assert!(self.mcus.len() <= total, "too many MCUs");
        let blank = vec![Block::default(); self.blocks_per_mcu()];

        for m in 0..total {
            let mut blocks = self.mcus.get(m).unwrap_or(&blank).iter();
            for (c, &(h, v)) in sampling.iter().enumerate() {
                for block in blocks.by_ref().take(h * v) {
                    writer.block(block, &mut preds[c], &dc_codes, &ac_codes);
                }
            }
            let interval = self.restart_interval as usize;
            if interval > 0 && (m + 1) % interval == 0 && m + 1 < total {
                writer.flush();
                let code = match self.wrong_restart {
                    Some((index, code)) if index == restart_markers => code,
                    _ => 0xd0 + (restart_markers & 7) as u8,
                };
                writer.out.extend_from_slice(&[0xff, code]);
                restart_markers += 1;
                preds.fill(0);
            }
        }
        writer.flush();
        let mut data = writer.out;
        data.extend_from_slice(&[0xff, 0xd9]);
        Encoded {
            data,
            scan_offset,
            restart_markers,
        }
    }
}

fn put_segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    out.extend_from_slice(&[0xff, marker]);
    out.extend_from_slice(&(payload.len() as u16 + 2).to_be_bytes());
    out.extend_from_slice(payload);
}

/// `(code, length)` per symbol, following the canonical assignment.
fn canonical_codes(counts: &[u8; 16], symbols: &[u8]) -> [Option<(u32, u32)>; 256] {
    let mut codes = [None; 256];
    let mut code = 0u32;
    let mut symbols = symbols.iter();
    for (i, &count) in counts.iter().enumerate() {
        for &symbol in symbols.by_ref().take(count as usize) {
            codes[symbol as usize] = Some((code, i as u32 + 1));
            code += 1;
        }
        code <<= 1;
    }
    codes
}

/// Magnitude category and the bits that encode `value` within it.
fn magnitude(value: i32) -> (u32, u32) {
    if value == 0 {
        return (0, 0);
    }
    let category = 32 - value.unsigned_abs().leading_zeros();
    let bits = if value < 0 { value - 1 } else { value };
    (category, bits as u32 & ((1 << category) - 1))
}

struct BitWriter {
    out: Vec<u8>,
    acc: u8,
    nbits: u32,
}

impl BitWriter {
    fn bit(&mut self, bit: bool) {
        self.acc = (self.acc << 1) | bit as u8;
        self.nbits += 1;
        if self.nbits == 8 {
            self.out.push(self.acc);
            if self.acc == 0xff {
                self.out.push(0x00);
            }
            self.acc = 0;
            self.nbits = 0;
        }
    }

    fn write(&mut self, value: u32, len: u32) {
        for i in (0..len).rev() {
            self.bit((value >> i) & 1 == 1);
        }
    }

    fn symbol(&mut self, codes: &[Option<(u32, u32)>; 256], symbol: u8) {
        let (code, len) = codes[symbol as usize]
            .unwrap_or_else(|| panic!("symbol {symbol:02x} is not in the table"));
        self.write(code, len);
    }

    /// Pads the current byte with 1-bits.
    fn flush(&mut self) {
        while self.nbits != 0 {
            self.bit(true);
        }
    }

    fn block(
        &mut self,
        block: &Block,
        pred: &mut i32,
        dc_codes: &[Option<(u32, u32)>; 256],
        ac_codes: &[Option<(u32, u32)>; 256],
    ) {
        let (category, bits) = magnitude(block.dc - *pred);
        *pred = block.dc;
        self.symbol(dc_codes, category as u8);
        self.write(bits, category);

        let mut ac: Vec<(usize, i32)> = block.ac.iter().copied().filter(|&(_, v)| v != 0).collect();
        ac.sort_by_key(|&(k, _)| k);
        let mut last = 0;
        for (k, value) in ac {
            assert!(k > last && k < 64, "bad coefficient index {k}");
            let mut run = k - last - 1;
            while run >= 16 {
                self.symbol(ac_codes, 0xf0);
                run -= 16;
            }
            let (category, bits) = magnitude(value);
            self.symbol(ac_codes, ((run as u8) << 4) | category as u8);
            self.write(bits, category);
            last = k;
        }
        if last != 63 {
            self.symbol(ac_codes, 0x00);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_floats() {
        assert_almost_eq!(1.0000001f64, 1.0000002, 0.000001);
        assert_almost_eq!(1.0, 1.1, 0.2);
    }

    #[test]
    fn test_with_integers() {
        assert_almost_eq!(100, 101, 2);
        assert_almost_eq!(777u32, 770, 7);
        assert_almost_eq!(500i64, 498, 3);
    }

    #[test]
    fn test_panic() {
        use std::panic;
        let result = panic::catch_unwind(|| {
            assert_almost_eq!(1.0, 1.2, 0.1);
        });
        assert!(
            result.is_err(),
            "Expected assert_almost_eq! to panic, but it didn't"
        );

        let result = panic::catch_unwind(|| {
            assert_almost_eq!(100, 105, 2);
        });
        assert!(
            result.is_err(),
            "Expected assert_almost_eq! to panic, but it didn't"
        );
    }

    #[test]
    fn canonical_code_assignment() {
        let dc = canonical_codes(&DC_COUNTS, &DC_SYMBOLS);
        assert_eq!(dc[0], Some((0, 4)));
        assert_eq!(dc[11], Some((11, 4)));
        assert_eq!(dc[12], None);
        let ac = canonical_codes(&AC_COUNTS, &AC_SYMBOLS);
        assert_eq!(ac[0x00], Some((0b00, 2)));
        assert_eq!(ac[0x01], Some((0b01000, 5)));
        assert_eq!(ac[0xf0], Some((0b11000, 5)));
    }

    #[test]
    fn magnitudes() {
        assert_eq!(magnitude(0), (0, 0));
        assert_eq!(magnitude(1), (1, 1));
        assert_eq!(magnitude(-1), (1, 0));
        assert_eq!(magnitude(-7), (3, 0));
        assert_eq!(magnitude(-4), (3, 3));
        assert_eq!(magnitude(64), (7, 64));
        assert_eq!(magnitude(-2047), (11, 0));
    }

    #[test]
    fn stuffing_and_markers() {
        // DC category 11 with all-ones bits forces 0xff bytes into the scan.
        let encoded = JpegBuilder::grayscale(16, 8)
            .restart_interval(1)
            .mcus([vec![Block::flat(2047)], vec![Block::flat(2047)]])
            .build();
        let scan = &encoded.data[encoded.scan_offset..];
        assert_eq!(encoded.restart_markers, 1);
        assert!(scan.windows(2).any(|w| w == [0xff, 0x00]));
        assert!(scan.windows(2).any(|w| w == [0xff, 0xd0]));
        assert!(scan.ends_with(&[0xff, 0xd9]));
    }

    #[test]
    fn flat_samples() {
        assert_eq!(flat_sample(0, 1), 128);
        assert_eq!(flat_sample(80, 1), 138);
        assert_eq!(flat_sample(-1024, 1), 0);
        assert_eq!(flat_sample(100, 16), 255);
    }
}

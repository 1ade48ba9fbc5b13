// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::{
    BLOCK_SIZE,
    bit_reader::BitReader,
    error::{Error, Result},
    huffman::HuffmanTable,
    idct::idct_8x8,
    quant::{QuantTable, ZIGZAG},
};

const END_OF_BLOCK: u8 = 0x00;
const ZERO_RUN: u8 = 0xf0;

/// Reads `size` magnitude bits and maps them onto a signed value: the lower
/// half of the range is negative.
fn receive_extend(br: &mut BitReader, size: u8) -> Result<i32> {
    if size == 0 {
        return Ok(0);
    }
    let value = br.read_bits(size as usize)? as i32;
    if value < 1 << (size - 1) {
        Ok(value + (-1 << size) + 1)
    } else {
        Ok(value)
    }
}

/// Entropy tables and quantizer used for the blocks of one component.
pub(crate) struct BlockTables<'a> {
    pub dc: &'a HuffmanTable,
    pub ac: &'a HuffmanTable,
    pub quant: &'a QuantTable,
}

/// Decodes the dequantized coefficients of one block, in natural order.
/// `dc_pred` carries the DC value from the previous block of the component.
pub(crate) fn decode_coefficients(
    br: &mut BitReader,
    tables: &BlockTables,
    dc_pred: &mut i32,
) -> Result<[i32; BLOCK_SIZE]> {
    let mut coeffs = [0; BLOCK_SIZE];

    let size = tables.dc.decode_symbol(br)?;
    if size > 15 {
        return Err(Error::InvalidRunSize(size));
    }
    *dc_pred = dc_pred.wrapping_add(receive_extend(br, size)?);
    coeffs[0] = dc_pred.wrapping_mul(tables.quant.at_zigzag(0));

    let mut k = 0;
    while k < BLOCK_SIZE - 1 {
        let symbol = tables.ac.decode_symbol(br)?;
        if symbol == END_OF_BLOCK {
            break;
        }
        let (run, size) = (symbol >> 4, symbol & 0x0f);
        if size == 0 && symbol != ZERO_RUN {
            return Err(Error::InvalidRunSize(symbol));
        }
        k += run as usize + 1;
        if k >= BLOCK_SIZE {
            return Err(Error::CoefficientOverflow(k));
        }
        let value = receive_extend(br, size)?;
        coeffs[ZIGZAG[k] as usize] = value * tables.quant.at_zigzag(k);
    }
    Ok(coeffs)
}

/// Decodes one block and writes its samples to `out`, with rows `stride`
/// bytes apart. Nothing is written if decoding fails.
pub(crate) fn decode_block(
    br: &mut BitReader,
    tables: &BlockTables,
    dc_pred: &mut i32,
    out: &mut [u8],
    stride: usize,
) -> Result<()> {
    let mut coeffs = decode_coefficients(br, tables, dc_pred)?;
    idct_8x8(&mut coeffs, out, stride);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    // DC: sizes 0..=11, all 4 bits long. AC: end-of-block "00", then 5-bit
    // codes starting at 01000.
    fn tables() -> (HuffmanTable, HuffmanTable, QuantTable) {
        let mut dc_counts = [0; 16];
        dc_counts[3] = 12;
        let dc = HuffmanTable::build(&dc_counts, &(0..12).collect::<Vec<u8>>()).unwrap();
        let mut ac_counts = [0; 16];
        ac_counts[1] = 1;
        ac_counts[4] = 4;
        let ac = HuffmanTable::build(&ac_counts, &[0x00, 0x01, 0x02, 0xf0, 0x11]).unwrap();
        (dc, ac, QuantTable::from_zigzag(&[2; BLOCK_SIZE]))
    }

    #[test]
    fn sign_extension() -> Result<()> {
        // 3 bits: 000 -> -7, 011 -> -4, 100 -> 4, 111 -> 7.
        let mut br = BitReader::new(&[0b0000_1110, 0b0111_0000]);
        assert_eq!(receive_extend(&mut br, 3)?, -7);
        assert_eq!(receive_extend(&mut br, 3)?, -4);
        assert_eq!(receive_extend(&mut br, 3)?, 4);
        assert_eq!(receive_extend(&mut br, 3)?, 7);
        assert_eq!(receive_extend(&mut br, 0)?, 0);
        Ok(())
    }

    #[test]
    fn dc_prediction_and_ac_placement() -> Result<()> {
        let (dc, ac, quant) = tables();
        let tables = BlockTables {
            dc: &dc,
            ac: &ac,
            quant: &quant,
        };
        // DC size 2 "0010" + "11" (3), AC 0x01 "01000" + "1" (1),
        // AC 0x11 "01011" + "0" (-1), EOB "00".
        let mut br = BitReader::new(&[0b0010_1101, 0b0001_0101, 0b1000_0000]);
        let mut pred = 10;
        let coeffs = decode_coefficients(&mut br, &tables, &mut pred)?;
        assert_eq!(pred, 13);
        assert_eq!(coeffs[0], 26);
        // Zigzag 1 is (0, 1); zigzag 3 is (2, 0).
        assert_eq!(coeffs[1], 2);
        assert_eq!(coeffs[16], -2);
        assert_eq!(coeffs.iter().filter(|&&c| c != 0).count(), 3);
        assert_eq!(br.total_bits_read(), 20);
        Ok(())
    }

    #[test]
    fn zero_runs_past_the_block_fail() {
        let (dc, ac, quant) = tables();
        let tables = BlockTables {
            dc: &dc,
            ac: &ac,
            quant: &quant,
        };
        // DC size 0, then four 16-zero runs land on index 64.
        let mut br = BitReader::new(&[0b0000_0101, 0b0010_1001, 0b0100_1010, 0b0000_0000]);
        let mut pred = 0;
        assert_eq!(
            decode_coefficients(&mut br, &tables, &mut pred),
            Err(Error::CoefficientOverflow(64))
        );
    }

    #[test]
    fn failed_block_leaves_output_untouched() {
        let (dc, ac, quant) = tables();
        let tables = BlockTables {
            dc: &dc,
            ac: &ac,
            quant: &quant,
        };
        // 1111 is not a DC code.
        let mut br = BitReader::new(&[0xf0]);
        let mut out = [0x80; BLOCK_SIZE];
        let mut pred = 0;
        assert_eq!(
            decode_block(&mut br, &tables, &mut pred, &mut out, 8),
            Err(Error::UndefinedHuffmanCode)
        );
        assert_eq!(out, [0x80; BLOCK_SIZE]);
    }
}

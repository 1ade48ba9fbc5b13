// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use byteorder::{BigEndian, ByteOrder};

use crate::{
    BLOCK_DIM, BLOCK_SIZE,
    api::{ChromaMode, DecoderOptions},
    bit_reader::BitReader,
    block::{BlockTables, decode_block},
    error::{Error, Result},
    exif,
    huffman::{self, HuffmanTable},
    image::Plane,
    marker::{Marker, MarkerReader},
    quant::{self, QuantTable},
    upsample::ChromaSiting,
    util::tracing_wrappers::*,
};

/// Smallest subsampled plane the accurate upsampler can filter.
const MIN_FILTERABLE_SIZE: usize = 3;

#[derive(Debug)]
pub(crate) struct Component {
    pub id: u8,
    /// Horizontal and vertical sampling factors.
    pub ssx: usize,
    pub ssy: usize,
    pub quant_selector: usize,
    pub dc_table: usize,
    pub ac_table: usize,
    pub dc_pred: i32,
    /// `None` when pixel decoding is skipped.
    pub plane: Option<Plane>,
}

#[derive(Debug)]
pub(crate) struct Frame {
    pub width: usize,
    pub height: usize,
    pub components: Vec<Component>,
    /// MCU grid dimensions.
    pub mcu_count: (usize, usize),
}

/// Everything learned from one stream.
#[derive(Debug, Default)]
pub(crate) struct DecodeState {
    pub frame: Option<Frame>,
    quant: [Option<QuantTable>; quant::NUM_SLOTS],
    huffman: [HuffmanTable; huffman::NUM_SLOTS],
    restart_interval: u16,
    pub chroma_siting: ChromaSiting,
    /// Set once a scan header has been accepted.
    pub valid: bool,
    /// Set once entropy decoding has started.
    pub decoded: bool,
    pub restart_markers: usize,
}

impl DecodeState {
    /// Parses `data` up to and including the scan. Errors met after
    /// `decoded` was set leave a partially decoded image behind.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, err))]
    pub fn decode(&mut self, data: &[u8], options: &DecoderOptions) -> Result<()> {
        let mut reader = MarkerReader::new(data)?;
        loop {
            let marker = reader.next_marker()?;
            match marker {
                Marker::Sof(0) => {
                    let payload = reader.read_segment()?;
                    self.read_frame_header(payload, options)?;
                }
                Marker::Sof(n) => return Err(Error::UnsupportedFrameType(n)),
                Marker::Dac => return Err(Error::ArithmeticCoding),
                Marker::Dht => {
                    let payload = reader.read_segment()?;
                    self.read_huffman_tables(payload)?;
                }
                Marker::Dqt => {
                    let payload = reader.read_segment()?;
                    self.read_quant_tables(payload)?;
                }
                Marker::Dri => {
                    let payload = reader.read_segment()?;
                    if payload.len() < 2 {
                        return Err(Error::TruncatedSegment("DRI"));
                    }
                    self.restart_interval = BigEndian::read_u16(payload);
                    trace!("restart interval {}", self.restart_interval);
                }
                Marker::Sos => {
                    let payload = reader.read_segment()?;
                    self.read_scan_header(payload)?;
                    self.valid = true;
                    if options.skip_pixel_decode {
                        return Ok(());
                    }
                    self.decoded = true;
                    return self.decode_scan(&mut BitReader::new(reader.remaining()));
                }
                Marker::App(1)
                    if !options.skip_pixel_decode
                        && options.chroma_mode == ChromaMode::Accurate =>
                {
                    let payload = reader.read_segment()?;
                    if let Some(siting) = exif::read_chroma_siting(payload) {
                        debug!("exif chroma siting: {siting}");
                        self.chroma_siting = siting;
                    }
                }
                Marker::App(_) | Marker::Com => {
                    let offset = reader.offset();
                    let payload = reader.read_segment()?;
                    trace!("skipping {marker:?} at {offset}, {} bytes", payload.len());
                }
                Marker::Eoi => return Err(Error::MissingScan),
                Marker::Soi => return Err(Error::UnsupportedMarker(0xd8)),
                Marker::Rst(n) => return Err(Error::UnsupportedMarker(0xd0 + n)),
                Marker::Other(code) => return Err(Error::UnsupportedMarker(code)),
            }
        }
    }

    fn read_frame_header(&mut self, payload: &[u8], options: &DecoderOptions) -> Result<()> {
        if self.frame.is_some() {
            return Err(Error::DuplicateFrame);
        }
        if payload.len() < 6 {
            return Err(Error::TruncatedSegment("SOF"));
        }
        if payload[0] != 8 {
            return Err(Error::UnsupportedPrecision(payload[0]));
        }
        let height = BigEndian::read_u16(&payload[1..3]) as usize;
        let width = BigEndian::read_u16(&payload[3..5]) as usize;
        let num_components = payload[5];
        if num_components != 1 && num_components != 3 {
            return Err(Error::UnsupportedComponentCount(num_components));
        }
        let specs = payload
            .get(6..6 + 3 * num_components as usize)
            .ok_or(Error::TruncatedSegment("SOF"))?;
        if width == 0 || height == 0 {
            return Err(Error::UnsupportedImageSize(width, height));
        }
        match options.pixel_limit {
            Some(limit) if width * height > limit => {
                return Err(Error::PixelLimitExceeded(width * height, limit));
            }
            _ => {}
        }

        let mut components = Vec::with_capacity(num_components as usize);
        for (i, spec) in specs.chunks_exact(3).enumerate() {
            let (ssx, ssy) = (spec[1] >> 4, spec[1] & 0x0f);
            for factor in [ssx, ssy] {
                if factor == 0 {
                    return Err(Error::InvalidSamplingFactor(factor, i));
                }
                if factor > 4 || !factor.is_power_of_two() {
                    return Err(Error::UnsupportedSamplingFactor(factor, i));
                }
            }
            if spec[2] as usize >= quant::NUM_SLOTS {
                return Err(Error::InvalidQuantSelector(spec[2]));
            }
            components.push(Component {
                id: spec[0],
                ssx: ssx as usize,
                ssy: ssy as usize,
                quant_selector: spec[2] as usize,
                dc_table: 0,
                ac_table: 0,
                dc_pred: 0,
                plane: None,
            });
        }
        if let [gray] = components.as_mut_slice() {
            gray.ssx = 1;
            gray.ssy = 1;
        }

        let ssxmax = components.iter().map(|c| c.ssx).max().unwrap_or(1);
        let ssymax = components.iter().map(|c| c.ssy).max().unwrap_or(1);
        let mcu_size = (ssxmax * BLOCK_DIM, ssymax * BLOCK_DIM);
        let mcu_count = (width.div_ceil(mcu_size.0), height.div_ceil(mcu_size.1));
        debug!(
            "frame {width}x{height}, {num_components} components, {}x{} MCUs of {}x{}",
            mcu_count.0, mcu_count.1, mcu_size.0, mcu_size.1
        );

        for (i, c) in components.iter_mut().enumerate() {
            let plane_width = (width * c.ssx).div_ceil(ssxmax);
            let plane_height = (height * c.ssy).div_ceil(ssymax);
            if (c.ssx < ssxmax && plane_width < MIN_FILTERABLE_SIZE)
                || (c.ssy < ssymax && plane_height < MIN_FILTERABLE_SIZE)
            {
                return Err(Error::PlaneTooSmall(i, plane_width, plane_height));
            }
            if options.skip_pixel_decode {
                continue;
            }
            let stride = mcu_count.0 * mcu_size.0 * c.ssx / ssxmax;
            let rows = mcu_count.1 * mcu_size.1 * c.ssy / ssymax;
            c.plane = Some(Plane::new_filled(
                (plane_width, plane_height),
                (stride, rows),
                0x80,
            )?);
        }

        self.frame = Some(Frame {
            width,
            height,
            components,
            mcu_count,
        });
        Ok(())
    }

    fn read_huffman_tables(&mut self, mut payload: &[u8]) -> Result<()> {
        while let Some(&class_id) = payload.first() {
            if class_id & 0xec != 0 {
                return Err(Error::InvalidHuffmanClass(class_id));
            }
            if class_id & 0x02 != 0 {
                return Err(Error::UnsupportedHuffmanId(class_id & 0x0f));
            }
            let counts: &[u8; 16] = payload
                .get(1..17)
                .and_then(|c| c.try_into().ok())
                .ok_or(Error::TruncatedSegment("DHT"))?;
            let total: usize = counts.iter().map(|&c| c as usize).sum();
            let symbols = payload
                .get(17..17 + total)
                .ok_or(Error::TruncatedSegment("DHT"))?;
            let slot = ((class_id >> 3) | class_id) as usize & 3;
            trace!("huffman table class {} id {}: {total} codes", class_id >> 4, class_id & 1);
            self.huffman[slot] = HuffmanTable::build(counts, symbols)?;
            payload = &payload[17 + total..];
        }
        Ok(())
    }

    fn read_quant_tables(&mut self, mut payload: &[u8]) -> Result<()> {
        while let Some(&precision_id) = payload.first() {
            let (precision, id) = (precision_id >> 4, precision_id & 0x0f);
            if precision != 0 {
                return Err(Error::UnsupportedQuantPrecision(id));
            }
            if id as usize >= quant::NUM_SLOTS {
                return Err(Error::InvalidQuantSelector(id));
            }
            let values: &[u8; BLOCK_SIZE] = payload
                .get(1..1 + BLOCK_SIZE)
                .and_then(|v| v.try_into().ok())
                .ok_or(Error::TruncatedSegment("DQT"))?;
            trace!("quantization table {id}");
            self.quant[id as usize] = Some(QuantTable::from_zigzag(values));
            payload = &payload[1 + BLOCK_SIZE..];
        }
        Ok(())
    }

    fn read_scan_header(&mut self, payload: &[u8]) -> Result<()> {
        let frame = self.frame.as_mut().ok_or(Error::MissingFrame("SOS"))?;
        let num_components = *payload.first().ok_or(Error::TruncatedSegment("SOS"))?;
        if num_components as usize != frame.components.len() {
            return Err(Error::UnsupportedScanComponents(num_components));
        }
        let n = num_components as usize;
        let (specs, spectral) = payload
            .get(1..4 + 2 * n)
            .ok_or(Error::TruncatedSegment("SOS"))?
            .split_at(2 * n);
        for (c, spec) in frame.components.iter_mut().zip(specs.chunks_exact(2)) {
            if spec[0] != c.id {
                return Err(Error::ScanComponentMismatch {
                    expected: c.id,
                    found: spec[0],
                });
            }
            if spec[1] & 0xee != 0 {
                return Err(Error::InvalidTableSelectors(spec[1]));
            }
            c.dc_table = (spec[1] >> 4) as usize;
            c.ac_table = (spec[1] & 1) as usize | 2;
        }
        if spectral != [0, 63, 0] {
            return Err(Error::UnsupportedSpectralSelection(
                spectral[0],
                spectral[1],
                spectral[2],
            ));
        }
        for c in frame.components.iter() {
            if self.quant[c.quant_selector].is_none() {
                return Err(Error::UndefinedQuantTable(c.quant_selector));
            }
            for table in [c.dc_table, c.ac_table] {
                if !self.huffman[table].is_defined() {
                    return Err(Error::UndefinedHuffmanTable(table));
                }
            }
        }
        Ok(())
    }

    fn decode_scan(&mut self, br: &mut BitReader) -> Result<()> {
        let DecodeState {
            frame,
            quant,
            huffman,
            restart_interval,
            restart_markers,
            ..
        } = self;
        let frame = frame.as_mut().ok_or(Error::MissingFrame("SOS"))?;
        let (mcu_cols, mcu_rows) = frame.mcu_count;
        let mut restarts_left = *restart_interval;
        let mut next_restart = 0u8;
        for c in frame.components.iter_mut() {
            c.dc_pred = 0;
        }

        for mcu in 0..mcu_cols * mcu_rows {
            let (mbx, mby) = (mcu % mcu_cols, mcu / mcu_cols);
            for c in frame.components.iter_mut() {
                let tables = BlockTables {
                    dc: &huffman[c.dc_table],
                    ac: &huffman[c.ac_table],
                    quant: quant[c.quant_selector]
                        .as_ref()
                        .ok_or(Error::UndefinedQuantTable(c.quant_selector))?,
                };
                let plane = c.plane.as_mut().ok_or(Error::NotDecoded)?;
                let stride = plane.stride();
                for sby in 0..c.ssy {
                    for sbx in 0..c.ssx {
                        let y = (mby * c.ssy + sby) * BLOCK_DIM;
                        let x = (mbx * c.ssx + sbx) * BLOCK_DIM;
                        decode_block(
                            br,
                            &tables,
                            &mut c.dc_pred,
                            &mut plane.pixels_mut()[y * stride + x..],
                            stride,
                        )?;
                    }
                }
            }

            if *restart_interval == 0 || mcu + 1 == mcu_cols * mcu_rows {
                continue;
            }
            restarts_left -= 1;
            if restarts_left == 0 {
                br.align_to_byte();
                let found = br.read_bits(16)? as u16;
                if found & 0xfff8 != 0xffd0 || (found & 7) as u8 != next_restart {
                    return Err(Error::RestartMismatch {
                        expected: next_restart,
                        found,
                    });
                }
                trace!("restart marker {next_restart} after MCU {mcu}");
                next_restart = (next_restart + 1) & 7;
                restarts_left = *restart_interval;
                *restart_markers += 1;
                for c in frame.components.iter_mut() {
                    c.dc_pred = 0;
                }
            }
        }
        Ok(())
    }
}

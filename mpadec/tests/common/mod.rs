// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Builders for synthetic Layer III streams.

#![allow(dead_code)]

use std::io::Cursor;

use mpadec::{DecodeStats, DecoderOptions, Error, Mp3Decoder, PcmSamples, PcmUnit, SourceReader};

/// MPEG-1, 128 kbit/s, 44.1 kHz, mono, unprotected.
pub const MONO_HEADER: [u8; 4] = [0xff, 0xfb, 0x90, 0xc4];
/// MPEG-2, 64 kbit/s, 22.05 kHz, mono, unprotected.
pub const MPEG2_MONO_HEADER: [u8; 4] = [0xff, 0xf3, 0x80, 0xc4];

pub const MONO_FRAME_LEN: usize = 417;
pub const MPEG2_MONO_FRAME_LEN: usize = 208;
pub const MONO_SIDE_INFO_LEN: usize = 17;

/// Main data of a tone granule pair: quads table B codeword "0111" (only v set) and a positive
/// sign bit, once per granule.
pub const TONE_MAIN_DATA: [u8; 2] = [0x73, 0x80];

/// Accumulates bit fields MSB-first.
#[derive(Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    n_bits: usize,
}

impl BitWriter {
    pub fn put(&mut self, value: u32, width: u32) -> &mut Self {
        for i in (0..width).rev() {
            if self.n_bits % 8 == 0 {
                self.bytes.push(0);
            }
            // Fields wider than 32 bits are zero padding.
            if value.checked_shr(i).unwrap_or(0) & 1 == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 0x80 >> (self.n_bits % 8);
            }
            self.n_bits += 1;
        }
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// The side information of one long block granule of a mono MPEG-1 frame.
#[derive(Copy, Clone, Debug)]
pub struct MonoGranule {
    pub part2_3_length: u32,
    pub big_values: u32,
    pub global_gain: u32,
    pub count1table_select: bool,
}

impl MonoGranule {
    pub const SILENT: MonoGranule = MonoGranule {
        part2_3_length: 0,
        big_values: 0,
        global_gain: 0,
        count1table_select: false,
    };

    /// A single unit spectral line at unity gain.
    pub const TONE: MonoGranule = MonoGranule {
        part2_3_length: 5,
        big_values: 0,
        global_gain: 210,
        count1table_select: true,
    };
}

pub fn mono_side_info(main_data_begin: u32, granules: [MonoGranule; 2]) -> Vec<u8> {
    let mut bw = BitWriter::default();

    // main_data_begin, private bits, scfsi.
    bw.put(main_data_begin, 9).put(0, 5).put(0, 4);

    for gr in granules {
        bw.put(gr.part2_3_length, 12)
            .put(gr.big_values, 9)
            .put(gr.global_gain, 8)
            .put(0, 4) // scalefac_compress
            .put(0, 1) // window switching
            .put(0, 15) // table_select
            .put(0, 4) // region0_count
            .put(0, 3) // region1_count
            .put(0, 1) // preflag
            .put(0, 1) // scalefac_scale
            .put(u32::from(gr.count1table_select), 1);
    }

    let side_info = bw.into_bytes();
    assert_eq!(side_info.len(), MONO_SIDE_INFO_LEN);
    side_info
}

/// Builds a frame from a header, side information, and main data. The frame is zero filled up to
/// the header's frame length.
pub fn frame(header: [u8; 4], side_info: &[u8], main_data: &[u8]) -> Vec<u8> {
    let len = mpadec::header::parse(&header).unwrap().frame_len;

    let mut data = Vec::with_capacity(len);
    data.extend_from_slice(&header);
    data.extend_from_slice(side_info);
    data.extend_from_slice(main_data);

    assert!(data.len() <= len);
    data.resize(len, 0);
    data
}

pub fn silent_frame() -> Vec<u8> {
    frame(MONO_HEADER, &[0; MONO_SIDE_INFO_LEN], &[])
}

pub fn tone_frame() -> Vec<u8> {
    frame(MONO_HEADER, &mono_side_info(0, [MonoGranule::TONE; 2]), &TONE_MAIN_DATA)
}

/// An ID3v2.4 tag with `len` bytes of body.
pub fn id3v2_tag(len: usize) -> Vec<u8> {
    assert!(len < 1 << 21);
    let mut tag = b"ID3\x04\x00\x00".to_vec();
    let size = [(len >> 21) as u8, (len >> 14) as u8, (len >> 7) as u8, len as u8];
    tag.extend(size.iter().map(|b| b & 0x7f));
    tag.resize(10 + len, 0x20);
    tag
}

pub fn id3v1_tag() -> Vec<u8> {
    let mut tag = b"TAG".to_vec();
    tag.resize(128, 0x20);
    tag
}

/// An Info frame with a LAME-style extension written by "Lavf58.76".
pub fn info_frame(num_frames: u32, delay: u32, padding: u32) -> Vec<u8> {
    let mut tag = Vec::new();
    tag.extend_from_slice(b"Info");
    tag.extend_from_slice(&3u32.to_be_bytes());
    tag.extend_from_slice(&num_frames.to_be_bytes());
    tag.extend_from_slice(&(MONO_FRAME_LEN as u32 * (num_frames + 1)).to_be_bytes());
    tag.extend_from_slice(b"Lavf58.76");
    tag.extend_from_slice(&[0; 12]);

    let trim = delay << 12 | padding;
    tag.extend_from_slice(&trim.to_be_bytes()[1..]);

    frame(MONO_HEADER, &[0; MONO_SIDE_INFO_LEN], &tag)
}

/// The result of decoding a whole stream.
pub struct Decoded {
    pub units: Vec<PcmUnit>,
    pub errors: usize,
    pub stats: DecodeStats,
}

impl Decoded {
    /// All samples of all units, as f32.
    pub fn samples(&self) -> Vec<f32> {
        self.units
            .iter()
            .flat_map(|unit| match &unit.samples {
                PcmSamples::F32(buf) => buf.clone(),
                PcmSamples::S16(buf) => buf.iter().map(|&s| f32::from(s) / 32767.0).collect(),
            })
            .collect()
    }
}

/// Decodes `data` to the end, continuing after recoverable errors.
pub fn decode_all(data: Vec<u8>, opts: DecoderOptions) -> Decoded {
    let mut decoder = Mp3Decoder::new(opts);
    decoder.begin_decode(SourceReader::new(Cursor::new(data), "test")).unwrap();

    let mut units = Vec::new();
    let mut errors = 0;

    loop {
        match decoder.decode() {
            Ok(Some(unit)) => units.push(unit),
            Ok(None) => break,
            Err(Error::DecodeError(_)) => errors += 1,
            Err(err) => panic!("unrecoverable error: {}", err),
        }
    }

    Decoded { units, errors, stats: decoder.stats().clone() }
}

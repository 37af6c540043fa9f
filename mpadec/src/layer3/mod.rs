// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The layer III decode pipeline: side information, main data, and the per-granule stages from
//! requantization to polyphase synthesis.

use std::fmt;

use log::{trace, warn};
use symphonia_core::errors::{decode_error, Error, Result};
use symphonia_core::io::{BitReaderLtr, ReadBitsLtr};

use crate::common::*;
use crate::header::FrameHeader;
use crate::reservoir::{BitReservoir, MAX_MAIN_DATA_BEGIN};
use crate::synthesis;
use crate::sync::Frame;

mod bitstream;
mod codebooks;
mod huffman;
mod hybrid_synthesis;
mod requantize;
mod stereo;

/// `FrameData` contains the side_info and main_data portions of a MPEG audio frame.
#[derive(Default, Debug)]
struct FrameData {
    /// The byte offset, backwards from the end of the bit reservoir, of the first bit of this
    /// frame's main_data. If 0, main_data begins after the side_info of this frame.
    main_data_begin: u16,
    /// Scale factor selector information, per channel (MPEG1 only). Bands that share scale
    /// factors between both granules are indicated by a true. The second granule does not store
    /// them.
    ///
    /// Mapping of array indicies to bands [0..6, 6..11, 11..16, 16..21].
    scfsi: [[bool; 4]; 2],
    /// The granules.
    granules: [Granule; 2],
}

impl FrameData {
    /// Get a mutable slice to the granule(s) in side_info. For MPEG1, a slice of 2 granules are
    /// returned. For MPEG2/2.5, a single granule slice is returned.
    #[inline(always)]
    fn granules_mut(&mut self, header: &FrameHeader) -> &mut [Granule] {
        &mut self.granules[..header.n_granules()]
    }
}

#[derive(Default, Debug)]
struct Granule {
    /// Channels in the granule.
    channels: [GranuleChannel; 2],
}

struct GranuleChannel {
    /// Total number of bits used for scale factors (part2) and Huffman encoded data (part3).
    part2_3_length: u16,
    /// HALF the number of samples in the big_values partition.
    big_values: u16,
    /// Logarithmic quantization step size.
    global_gain: u8,
    /// A 4-bit index into the scale factor length table for MPEG1. A 9-bit value that encodes
    /// the scale factor lengths and band counts for MPEG2/2.5.
    scalefac_compress: u16,
    /// The window shape.
    block_type: BlockType,
    /// Gain offsets for the three short windows. Each has a maximum value of 7 (3 bits).
    subblock_gain: [u8; 3],
    /// The Huffman table to use for decoding `region[0..3]` of big_values.
    table_select: [u8; 3],
    /// The index of the first sample in region1 of big_values.
    region1_start: usize,
    /// The index of the first sample in region2 of big_values.
    region2_start: usize,
    /// Add the pre-emphasis table to the long block scale factors.
    preflag: bool,
    /// A 0.5x (false) or 1x (true) multiplier for scale factors.
    scalefac_scale: bool,
    /// Use Huffman Quads table A (false) or B (true), for decoding the count1 partition.
    count1table_select: bool,
    /// Long and short window scale factors. Their meaning depends on the block type.
    ///
    /// For `BlockType::Short { is_mixed: false }`:
    ///   - `scalefac_s[0..36]` -> `scalefacs[0..36]`
    ///
    /// For `BlockType::Short { is_mixed: true }`:
    ///   - `scalefac_l[0..switch]` -> `scalefacs[0..switch]`
    ///   - `scalefac_s[..]` -> `scalefacs[switch..]`
    ///
    /// For other block types:
    ///   - `scalefac_l[0..21]` -> `scalefacs[0..21]`
    ///
    /// The scale factors of the last short band, and of long band 21, are never transmitted and
    /// stay 0.
    scalefacs: [u8; 39],
    /// The starting sample index of the rzero partition, or the count of big_values and count1
    /// samples.
    rzero: usize,
}

impl Default for GranuleChannel {
    fn default() -> Self {
        GranuleChannel {
            part2_3_length: 0,
            big_values: 0,
            global_gain: 0,
            scalefac_compress: 0,
            block_type: BlockType::Long,
            subblock_gain: [0; 3],
            table_select: [0; 3],
            region1_start: 0,
            region2_start: 0,
            preflag: false,
            scalefac_scale: false,
            count1table_select: false,
            scalefacs: [0; 39],
            rzero: 0,
        }
    }
}

impl fmt::Debug for GranuleChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GranuleChannel")
            .field("part2_3_length", &self.part2_3_length)
            .field("big_values", &self.big_values)
            .field("global_gain", &self.global_gain)
            .field("scalefac_compress", &self.scalefac_compress)
            .field("block_type", &self.block_type)
            .field("subblock_gain", &self.subblock_gain)
            .field("table_select", &self.table_select)
            .field("region1_start", &self.region1_start)
            .field("region2_start", &self.region2_start)
            .field("preflag", &self.preflag)
            .field("scalefac_scale", &self.scalefac_scale)
            .field("count1table_select", &self.count1table_select)
            .field("scalefacs", &&self.scalefacs[..])
            .field("rzero", &self.rzero)
            .finish()
    }
}

/// The decoder scratch and carried state. Samples are scratch space reused by every frame.
/// The overlap, synthesis, and reservoir state carry from one frame to the next.
pub(crate) struct State {
    samples: [[[f32; 576]; 2]; 2],
    overlap: [[[f32; 18]; 32]; 2],
    synthesis: [synthesis::SynthesisState; 2],
    reservoir: BitReservoir,
}

impl State {
    pub fn new() -> Self {
        State {
            samples: [[[0f32; 576]; 2]; 2],
            overlap: [[[0f32; 18]; 32]; 2],
            synthesis: Default::default(),
            reservoir: BitReservoir::new(),
        }
    }

    /// Clears all carried state. Equivalent to a new `State`.
    pub fn reset(&mut self) {
        self.overlap = [[[0f32; 18]; 32]; 2];
        self.synthesis = Default::default();
        self.reservoir.clear();
    }
}

/// The result of decoding one frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FrameOutcome {
    /// PCM samples were written.
    Decoded,
    /// `main_data_begin` referenced bits that are not in the reservoir. The frame's main data was
    /// buffered for later frames, but no PCM was produced.
    Underflow,
}

/// Reads the main_data portion of a frame. `main_data` starts at the first bit of the frame's
/// main data. Each channel of each granule starts where the previous one's part2_3_length ended.
///
/// Returns the number of bytes of `main_data` used by the frame.
fn read_main_data(
    header: &FrameHeader,
    main_data: &[u8],
    frame_data: &mut FrameData,
    samples: &mut [[[f32; 576]; 2]; 2],
) -> Result<usize> {
    let mut part2_3_begin = 0;

    for gr in 0..header.n_granules() {
        for ch in 0..header.n_channels() {
            let byte_index = part2_3_begin >> 3;

            // Create a bit reader at the expected starting bit position.
            let mut bs = if byte_index < main_data.len() {
                let mut bs = BitReaderLtr::new(&main_data[byte_index..]);

                let bit_index = part2_3_begin & 0x7;

                if bit_index > 0 {
                    bs.ignore_bits(bit_index as u32)?;
                }

                bs
            }
            else if frame_data.granules[gr].channels[ch].part2_3_length == 0 {
                BitReaderLtr::new(&[])
            }
            else {
                return decode_error("mp3: invalid main_data offset");
            };

            // Read the scale factors (part2) and get the number of bits read.
            let part2_len = if header.is_mpeg1() {
                bitstream::read_scale_factors_mpeg1(&mut bs, gr, ch, frame_data)
            }
            else {
                bitstream::read_scale_factors_mpeg2(
                    &mut bs,
                    ch > 0 && header.is_intensity_stereo(),
                    &mut frame_data.granules[gr].channels[ch],
                )
            };

            let channel = &mut frame_data.granules[gr].channels[ch];

            let part2_3_length = u32::from(channel.part2_3_length);

            // The part2 length must be less than or equal to the part2_3_length.
            let part3_len = match part2_len {
                Ok(part2_len) if part2_len <= part2_3_length => part2_3_length - part2_len,
                Ok(_) => return decode_error("mp3: part2_3_length is not valid"),
                Err(Error::IoError(_)) => return decode_error("mp3: scale factors overrun"),
                Err(err) => return Err(err),
            };

            let huffman_result = huffman::read_huffman_samples(
                &mut bs,
                channel,
                part3_len,
                &mut samples[gr][ch],
            );

            // Running out of main data while decoding is a malformed frame, not a failed read of
            // the source. Report it as a decode error.
            channel.rzero = match huffman_result {
                Ok(rzero) => rzero,
                Err(Error::IoError(_)) => return decode_error("mp3: huffman decode overrun"),
                Err(err) => return Err(err),
            };

            part2_3_begin += part2_3_length as usize;
        }
    }

    Ok((part2_3_begin + 7) >> 3)
}

/// Decodes one frame into `out`, which receives `header.samples_per_frame()` interleaved sample
/// frames.
///
/// On error the carried state may be inconsistent and must be reset before the next frame.
pub(crate) fn decode_frame(
    frame: &Frame,
    state: &mut State,
    equalizer: Option<&[f32; 32]>,
    out: &mut [f32],
) -> Result<FrameOutcome> {
    let header = &frame.header;

    debug_assert!(out.len() >= header.samples_per_frame() * header.n_channels());

    let side_info = match frame.side_info() {
        Some(side_info) => side_info,
        None => return decode_error("mp3: frame too short for side_info"),
    };

    let mut frame_data: FrameData = Default::default();

    bitstream::read_side_info(&mut BitReaderLtr::new(side_info), header, &mut frame_data)?;

    trace!("main_data_begin={}", frame_data.main_data_begin);

    // Bits older than the largest back-reference can never be used again.
    let reservoir = &mut state.reservoir;
    reservoir.retain_unread(8 * MAX_MAIN_DATA_BEGIN as u64);

    let available = reservoir.bits_available();

    reservoir.write_bytes(frame.main_data())?;

    let main_data_begin = 8 * u64::from(frame_data.main_data_begin);

    if main_data_begin > available {
        warn!(
            "bit reservoir underflow: need {} bytes, have {} bytes",
            frame_data.main_data_begin,
            available / 8
        );
        return Ok(FrameOutcome::Underflow);
    }

    // Discard bits that precede this frame's main data.
    reservoir.skip(available - main_data_begin)?;

    let main_data_len = read_main_data(
        header,
        state.reservoir.bytes_ref(),
        &mut frame_data,
        &mut state.samples,
    )?;

    // Consume the bytes of main data used by this frame.
    let consumed = (8 * main_data_len as u64).min(state.reservoir.bits_available());
    state.reservoir.skip(consumed)?;

    let n_channels = header.n_channels();

    for gr in 0..header.n_granules() {
        let granule = &mut frame_data.granules[gr];

        for ch in 0..n_channels {
            requantize::requantize(header, &granule.channels[ch], &mut state.samples[gr][ch]);
        }

        if n_channels == 2 {
            stereo::stereo(header, granule, &mut state.samples[gr])?;
        }

        let pcm = &mut out[gr * 576 * n_channels..(gr + 1) * 576 * n_channels];

        for ch in 0..n_channels {
            let channel = &granule.channels[ch];
            let samples = &mut state.samples[gr][ch];

            // Reorder the spectral samples in short blocks into sub-band order.
            hybrid_synthesis::reorder(header, channel, samples);

            // Apply the anti-aliasing filter to all block types other than short.
            hybrid_synthesis::antialias(channel, samples);

            // Perform hybrid-synthesis (IMDCT and windowing).
            hybrid_synthesis::hybrid_synthesis(channel, &mut state.overlap[ch], samples);

            // Invert every second sample in every second sub-band to negate the frequency
            // inversion of the polyphase filterbank.
            hybrid_synthesis::frequency_inversion(samples);

            // Perform polyphase synthesis and generate PCM samples.
            synthesis::synthesis(
                &mut state.synthesis[ch],
                samples,
                equalizer,
                &mut pcm[ch..],
                n_channels,
            );
        }
    }

    Ok(FrameOutcome::Decoded)
}

// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Side information and scale factor (part2) readers.

use symphonia_core::errors::{decode_error, Result};
use symphonia_core::io::ReadBitsLtr;

use crate::common::*;
use crate::header::{ChannelMode, FrameHeader};

use super::{FrameData, Granule, GranuleChannel};

/// Pairs of bit lengths for MPEG version 1 scale factors. The first N bands have scale factors of
/// length slen1, while the remaining bands have length slen2. The switch point, N, depends on the
/// block type.
///
/// This table is indexed by scalefac_compress.
const SCALE_FACTOR_SLEN: [(u32, u32); 16] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (0, 3),
    (3, 0),
    (1, 1),
    (1, 2),
    (1, 3),
    (2, 1),
    (2, 2),
    (2, 3),
    (3, 1),
    (3, 2),
    (3, 3),
    (4, 2),
    (4, 3),
];

/// For MPEG version 2, the scale factors are split into four partitions, each with its own bit
/// length, slen[0..4]. The values in this table are the number of scale factors in each
/// partition.
///
/// This table is indexed by the scalefac_compress range, and block type (long, short, mixed).
const SCALE_FACTOR_MPEG2_NSFB: [[[usize; 4]; 3]; 6] = [
    // Intensity stereo right channel.
    [[7, 7, 7, 0], [12, 12, 12, 0], [6, 15, 12, 0]],
    [[6, 6, 6, 3], [12, 9, 9, 6], [6, 12, 9, 6]],
    [[8, 8, 5, 0], [15, 12, 9, 0], [6, 18, 9, 0]],
    // All other channels.
    [[6, 5, 5, 5], [9, 9, 9, 9], [6, 9, 9, 9]],
    [[6, 5, 7, 3], [9, 9, 12, 6], [6, 9, 12, 6]],
    [[11, 10, 0, 0], [18, 18, 0, 0], [15, 18, 0, 0]],
];

/// MPEG1 long block scale factor groups that `scfsi` may share between granules.
const SCFSI_BANDS: [(usize, usize); 4] = [(0, 6), (6, 11), (11, 16), (16, 21)];

/// Reads the side_info for a single channel in a granule.
fn read_granule_channel_side_info<B: ReadBitsLtr>(
    bs: &mut B,
    channel: &mut GranuleChannel,
    header: &FrameHeader,
) -> Result<()> {
    channel.part2_3_length = bs.read_bits_leq32(12)? as u16;
    channel.big_values = bs.read_bits_leq32(9)? as u16;

    // There are at most 576 samples in a granule, and 2 samples per big_value.
    if channel.big_values > 288 {
        return decode_error("mp3: granule big_values > 288");
    }

    channel.global_gain = bs.read_bits_leq32(8)? as u8;

    channel.scalefac_compress =
        if header.is_mpeg1() { bs.read_bits_leq32(4) } else { bs.read_bits_leq32(9) }? as u16;

    let window_switching = bs.read_bool()?;

    if window_switching {
        let block_type_enc = bs.read_bits_leq32(2)?;

        let is_mixed = bs.read_bool()?;

        channel.block_type = match block_type_enc {
            // Only transitional Long blocks (Start, End) are allowed with window switching.
            0b00 => return decode_error("mp3: invalid block_type"),
            0b01 => BlockType::Start,
            0b10 => BlockType::Short { is_mixed },
            _ => BlockType::End,
        };

        // Two regions, two table selectors.
        for table_select in &mut channel.table_select[..2] {
            *table_select = bs.read_bits_leq32(5)? as u8;
        }

        for gain in &mut channel.subblock_gain {
            *gain = bs.read_bits_leq32(3)? as u8;
        }

        // With window switching the region0 boundary is implicit.
        channel.region1_start = if header.is_mpeg2p5() {
            // For MPEG2.5, region0 spans 6 long bands for short blocks, and 8 otherwise.
            let region0_count = match channel.block_type {
                BlockType::Short { is_mixed: false } => 5 + 1,
                _ => 7 + 1,
            };

            SFB_LONG_BANDS[header.sample_rate_idx][region0_count]
        }
        else if header.is_mpeg1() || block_type_enc == 0b10 {
            // 8 long bands (MPEG1) or 9 short bands (MPEG1 and 2). Both sum to 36 samples.
            36
        }
        else {
            // 8 long bands of MPEG2 sum to 54 samples.
            54
        };

        // Region1 spans the remaining samples, region2 is empty.
        channel.region2_start = 576;
    }
    else {
        channel.block_type = BlockType::Long;

        for table_select in &mut channel.table_select {
            *table_select = bs.read_bits_leq32(5)? as u8;
        }

        // The region sizes are stored as 1 less than the actual band count.
        let region0_count = bs.read_bits_leq32(4)? as usize + 1;
        let region0_1_count = bs.read_bits_leq32(3)? as usize + region0_count + 1;

        channel.region1_start = SFB_LONG_BANDS[header.sample_rate_idx][region0_count];

        // The count in region0_1_count may exceed the last band (22).
        channel.region2_start = match region0_1_count {
            0..=22 => SFB_LONG_BANDS[header.sample_rate_idx][region0_1_count],
            _ => 576,
        };
    }

    // For MPEG2, preflag is determined implicitly when reading the scale factors.
    channel.preflag = if header.is_mpeg1() { bs.read_bool()? } else { false };

    channel.scalefac_scale = bs.read_bool()?;
    channel.count1table_select = bs.read_bool()?;

    Ok(())
}

/// Reads the side_info for all channels in a granule.
fn read_granule_side_info<B: ReadBitsLtr>(
    bs: &mut B,
    granule: &mut Granule,
    header: &FrameHeader,
) -> Result<()> {
    for channel in &mut granule.channels[..header.n_channels()] {
        read_granule_channel_side_info(bs, channel, header)?;
    }
    Ok(())
}

/// Reads the side_info of a frame into `FrameData`. Returns the length of the side_info in
/// bytes.
pub(super) fn read_side_info<B: ReadBitsLtr>(
    bs: &mut B,
    header: &FrameHeader,
    frame_data: &mut FrameData,
) -> Result<usize> {
    if header.is_mpeg1() {
        frame_data.main_data_begin = bs.read_bits_leq32(9)? as u16;

        // Private bits.
        match header.channel_mode {
            ChannelMode::Mono => bs.ignore_bits(5)?,
            _ => bs.ignore_bits(3)?,
        };

        for scfsi in &mut frame_data.scfsi[..header.n_channels()] {
            for band in scfsi.iter_mut() {
                *band = bs.read_bool()?;
            }
        }
    }
    else {
        frame_data.main_data_begin = bs.read_bits_leq32(8)? as u16;

        // Private bits.
        match header.channel_mode {
            ChannelMode::Mono => bs.ignore_bits(1)?,
            _ => bs.ignore_bits(2)?,
        }
    }

    for granule in frame_data.granules_mut(header) {
        read_granule_side_info(bs, granule, header)?;
    }

    Ok(header.side_info_len())
}

/// Reads the scale factors for a single channel in a granule of a MPEG1 frame. Returns the number
/// of bits read.
pub(super) fn read_scale_factors_mpeg1<B: ReadBitsLtr>(
    bs: &mut B,
    gr: usize,
    ch: usize,
    frame_data: &mut FrameData,
) -> Result<u32> {
    let mut bits_read = 0;

    let scfsi = frame_data.scfsi[ch];
    let (granule0, granule1) = frame_data.granules.split_at_mut(1);

    // The second granule may share scale factors with the first.
    let (channel, shared) = if gr == 0 {
        (&mut granule0[0].channels[ch], None)
    }
    else {
        (&mut granule1[0].channels[ch], Some(&granule0[0].channels[ch].scalefacs))
    };

    let (slen1, slen2) = SCALE_FACTOR_SLEN[usize::from(channel.scalefac_compress)];

    if let BlockType::Short { is_mixed } = channel.block_type {
        // Mixed blocks: 8 long bands then 3 short bands of 3 windows with slen1 bits. Otherwise 6
        // short bands of 3 windows with slen1 bits.
        let n_sfb = if is_mixed { 8 + 3 * 3 } else { 6 * 3 };

        if slen1 > 0 {
            for sf in &mut channel.scalefacs[..n_sfb] {
                *sf = bs.read_bits_leq32(slen1)? as u8;
            }
            bits_read += n_sfb as u32 * slen1;
        }

        // Then 6 short bands of 3 windows with slen2 bits.
        if slen2 > 0 {
            for sf in &mut channel.scalefacs[n_sfb..n_sfb + 6 * 3] {
                *sf = bs.read_bits_leq32(slen2)? as u8;
            }
            bits_read += 6 * 3 * slen2;
        }
    }
    else {
        for (i, &(start, end)) in SCFSI_BANDS.iter().enumerate() {
            let slen = if i < 2 { slen1 } else { slen2 };

            match shared {
                Some(shared) if scfsi[i] => {
                    channel.scalefacs[start..end].copy_from_slice(&shared[start..end]);
                }
                _ if slen > 0 => {
                    for sf in &mut channel.scalefacs[start..end] {
                        *sf = bs.read_bits_leq32(slen)? as u8;
                    }
                    bits_read += slen * (end - start) as u32;
                }
                _ => (),
            }
        }
    }

    Ok(bits_read)
}

/// Reads the scale factors for a single channel in a granule of a MPEG2/2.5 frame. Returns the
/// number of bits read.
pub(super) fn read_scale_factors_mpeg2<B: ReadBitsLtr>(
    bs: &mut B,
    is_intensity_stereo: bool,
    channel: &mut GranuleChannel,
) -> Result<u32> {
    let mut bits_read = 0;

    let block_index = match channel.block_type {
        BlockType::Short { is_mixed: true } => 2,
        BlockType::Short { is_mixed: false } => 1,
        _ => 0,
    };

    let (slen_table, nsfb_table) = if is_intensity_stereo {
        // The intensity stereo channel uses the upper 8 bits. The lowest bit selects the
        // intensity scale.
        let sfc = u32::from(channel.scalefac_compress) >> 1;

        match sfc {
            0..=179 => (
                [sfc / 36, (sfc % 36) / 6, (sfc % 36) % 6, 0],
                &SCALE_FACTOR_MPEG2_NSFB[0][block_index],
            ),
            180..=243 => (
                [((sfc - 180) % 64) >> 4, ((sfc - 180) % 16) >> 2, (sfc - 180) % 4, 0],
                &SCALE_FACTOR_MPEG2_NSFB[1][block_index],
            ),
            _ => (
                [(sfc - 244) / 3, (sfc - 244) % 3, 0, 0],
                &SCALE_FACTOR_MPEG2_NSFB[2][block_index],
            ),
        }
    }
    else {
        let sfc = u32::from(channel.scalefac_compress);

        // See ISO/IEC 13818-3 section 2.4.3.4.
        channel.preflag = sfc >= 500;

        match sfc {
            0..=399 => (
                [(sfc >> 4) / 5, (sfc >> 4) % 5, (sfc % 16) >> 2, sfc % 4],
                &SCALE_FACTOR_MPEG2_NSFB[3][block_index],
            ),
            400..=499 => (
                [((sfc - 400) >> 2) / 5, ((sfc - 400) >> 2) % 5, (sfc - 400) % 4, 0],
                &SCALE_FACTOR_MPEG2_NSFB[4][block_index],
            ),
            _ => (
                [(sfc - 500) / 3, (sfc - 500) % 3, 0, 0],
                &SCALE_FACTOR_MPEG2_NSFB[5][block_index],
            ),
        }
    };

    let mut start = 0;

    for (&slen, &n_sfb) in slen_table.iter().zip(nsfb_table.iter()) {
        // Scale factors with a length of 0 bits are 0.
        if slen > 0 {
            for sf in &mut channel.scalefacs[start..start + n_sfb] {
                *sf = bs.read_bits_leq32(slen)? as u8;
            }
            bits_read += slen * n_sfb as u32;
        }

        start += n_sfb;
    }

    Ok(bits_read)
}

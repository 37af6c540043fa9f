// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Requantization (dequantization and scaling) of the spectral samples.

use std::cmp::min;

use crate::common::*;
use crate::header::FrameHeader;

use super::GranuleChannel;

/// The pre-emphasis table from table B.6 in ISO/IEC 11172-3.
const PRE_EMPHASIS: [i32; 22] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 3, 3, 3, 2, 0];

/// Computes 2^(0.25 * exp).
#[inline(always)]
fn pow2_quarter(exp: i32) -> f32 {
    f64::powf(2.0, 0.25 * f64::from(exp)) as f32
}

/// Requantize long block samples in `buf`.
fn requantize_long(channel: &GranuleChannel, bands: &[usize], buf: &mut [f32; 576]) {
    // For long blocks dequantization and scaling is governed by the following equation:
    //
    //                     xr(i) = s(i)^(4/3) * 2^(0.25*A) * 2^(-B)
    // where:
    //       s(i) is the decoded Huffman sample
    //      xr(i) is the dequantized sample
    // and:
    //      A = global_gain[gr] - 210
    //      B = scalefac_multiplier * (scalefacs[gr][ch][sfb] + (preflag[gr] * pretab[sfb]))
    //
    // The samples in buf already hold s(i)^(4/3). Both powers are folded into 2^(0.25 * (A - 4B)).
    debug_assert!(bands.len() <= 23);

    let a = i32::from(channel.global_gain) - 210;

    // 4 * scalefac_multiplier, as a shift.
    let scalefac_shift = if channel.scalefac_scale { 2 } else { 1 };

    for (i, (&start, &end)) in bands.iter().zip(&bands[1..]).enumerate() {
        // Samples from rzero on are 0.
        if start >= channel.rzero {
            break;
        }

        let pre_emphasis = if channel.preflag { PRE_EMPHASIS[i] } else { 0 };

        let b = (i32::from(channel.scalefacs[i]) + pre_emphasis) << scalefac_shift;

        let scale = pow2_quarter(a - b);

        for sample in &mut buf[start..min(end, channel.rzero)] {
            *sample *= scale;
        }
    }
}

/// Requantize short block samples in `buf`. `bands` holds the window boundaries, and `first_sf`
/// the index of the scale factor of the first window.
fn requantize_short(
    channel: &GranuleChannel,
    bands: &[usize],
    first_sf: usize,
    buf: &mut [f32; 576],
) {
    // For short blocks dequantization and scaling is governed by the following equation:
    //
    //                     xr(i) = s(i)^(4/3) * 2^(0.25*A) * 2^(-B)
    // where:
    //       s(i) is the decoded Huffman sample
    //      xr(i) is the dequantized sample
    // and:
    //      A = global_gain[gr] - 210 - (8 * subblock_gain[gr][win])
    //      B = scalefac_multiplier * scalefacs[gr][ch][sfb][win]
    debug_assert!(bands.len() <= 40);

    let gain = i32::from(channel.global_gain) - 210;

    let a = [
        gain - 8 * i32::from(channel.subblock_gain[0]),
        gain - 8 * i32::from(channel.subblock_gain[1]),
        gain - 8 * i32::from(channel.subblock_gain[2]),
    ];

    let scalefac_shift = if channel.scalefac_scale { 2 } else { 1 };

    for (i, (&start, &end)) in bands.iter().zip(&bands[1..]).enumerate() {
        if start >= channel.rzero {
            break;
        }

        let sf = channel.scalefacs.get(first_sf + i).copied().unwrap_or(0);

        let b = i32::from(sf) << scalefac_shift;

        let scale = pow2_quarter(a[i % 3] - b);

        for sample in &mut buf[start..min(end, channel.rzero)] {
            *sample *= scale;
        }
    }
}

/// Requantize samples in `buf` regardless of block type.
pub(super) fn requantize(header: &FrameHeader, channel: &GranuleChannel, buf: &mut [f32; 576]) {
    match channel.block_type {
        BlockType::Short { is_mixed: false } => {
            requantize_short(channel, &SFB_SHORT_BANDS[header.sample_rate_idx], 0, buf);
        }
        BlockType::Short { is_mixed: true } => {
            // A mixed block starts with long bands up-to the switch point, followed by short
            // bands. The switch point is both a band boundary index and the index of the first
            // short scale factor.
            let bands = SFB_MIXED_BANDS[header.sample_rate_idx];
            let switch = SFB_MIXED_SWITCH_POINT[header.sample_rate_idx];

            requantize_long(channel, &bands[..=switch], buf);
            requantize_short(channel, &bands[switch..], switch, buf);
        }
        _ => {
            requantize_long(channel, &SFB_LONG_BANDS[header.sample_rate_idx], buf);
        }
    }
}

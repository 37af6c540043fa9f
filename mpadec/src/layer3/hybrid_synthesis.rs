// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Short block reordering, alias reduction, the IMDCT with windowing and overlap-add, and
//! frequency inversion.

use std::f64;

use lazy_static::lazy_static;

use crate::common::*;
use crate::header::FrameHeader;

use super::GranuleChannel;

lazy_static! {
    /// IMDCT window coefficients for Long, Start, Short, and End blocks, in that order.
    ///
    /// ```text
    /// Long:  W[ 0..36] = sin(PI/36 * (i + 0.5))
    ///
    /// Start: W[ 0..18] = sin(PI/36 * (i + 0.5))
    ///        W[18..24] = 1.0
    ///        W[24..30] = sin(PI/12 * ((i - 18) + 0.5))
    ///        W[30..36] = 0.0
    ///
    /// Short: W[ 0..12] = sin(PI/12 * (i + 0.5)), applied to each 12 sample window
    ///        W[12..36] = 0.0
    ///
    /// End:   W[ 0..6 ] = 0.0
    ///        W[ 6..12] = sin(PI/12 * ((i - 6) + 0.5))
    ///        W[12..18] = 1.0
    ///        W[18..36] = sin(PI/36 * (i + 0.5))
    /// ```
    static ref IMDCT_WINDOWS: [[f32; 36]; 4] = {
        const PI_36: f64 = f64::consts::PI / 36.0;
        const PI_12: f64 = f64::consts::PI / 12.0;

        let long = |i: usize| (PI_36 * (i as f64 + 0.5)).sin() as f32;
        let short = |i: usize| (PI_12 * (i as f64 + 0.5)).sin() as f32;

        let mut windows = [[0f32; 36]; 4];

        for (i, w) in windows[0].iter_mut().enumerate() {
            *w = long(i);
        }

        for (i, w) in windows[1][..30].iter_mut().enumerate() {
            *w = match i {
                0..=17 => long(i),
                18..=23 => 1.0,
                _ => short(i - 18),
            };
        }

        for (i, w) in windows[2][..12].iter_mut().enumerate() {
            *w = short(i);
        }

        for (i, w) in windows[3].iter_mut().enumerate().skip(6) {
            *w = match i {
                6..=11 => short(i - 6),
                12..=17 => 1.0,
                _ => long(i),
            };
        }

        windows
    };

    /// DCT-IV coefficients for the 36-point IMDCT: `cos(PI/18 * (n + 0.5) * (k + 0.5))`.
    static ref IMDCT36_DCT4: [[f32; 18]; 18] = {
        const PI_18: f64 = f64::consts::PI / 18.0;

        let mut cos = [[0f32; 18]; 18];

        for (n, cos_n) in cos.iter_mut().enumerate() {
            for (k, cos_nk) in cos_n.iter_mut().enumerate() {
                *cos_nk = (PI_18 * (n as f64 + 0.5) * (k as f64 + 0.5)).cos() as f32;
            }
        }

        cos
    };

    /// Coefficients for the 12-point IMDCT: `cos(PI/24 * (2i + 7) * (2k + 1))`.
    static ref IMDCT12_COS: [[f32; 6]; 12] = {
        const PI_24: f64 = f64::consts::PI / 24.0;

        let mut cos = [[0f32; 6]; 12];

        for (i, cos_i) in cos.iter_mut().enumerate() {
            for (k, cos_ik) in cos_i.iter_mut().enumerate() {
                *cos_ik = (PI_24 * ((2 * i + 7) * (2 * k + 1)) as f64).cos() as f32;
            }
        }

        cos
    };

    /// The alias reduction butterfly coefficients, CS and CA, from table B.9 of ISO/IEC 11172-3:
    ///
    /// ```text
    /// cs[i] =  1.0 / sqrt(1.0 + c[i]^2)
    /// ca[i] = c[i] / sqrt(1.0 + c[i]^2)
    /// ```
    static ref ANTIALIAS_CS_CA: ([f32; 8], [f32; 8]) = {
        const C: [f64; 8] = [-0.6, -0.535, -0.33, -0.185, -0.095, -0.041, -0.0142, -0.0037];

        let mut cs = [0f32; 8];
        let mut ca = [0f32; 8];

        for ((c, cs), ca) in C.iter().zip(&mut cs).zip(&mut ca) {
            let sqrt = f64::sqrt(1.0 + c * c);
            *cs = (1.0 / sqrt) as f32;
            *ca = (c / sqrt) as f32;
        }

        (cs, ca)
    };
}

/// Reorders the samples of short bands so the three windows are interleaved line by line.
///
/// ```text
///    <- Window 0 ->   <- Window 1 ->   <- Window 2 ->
///   [ 0 | 1 | 2 | 3 ][ 4 | 5 | 6 | 7 ][ 8 | 9 | a | b ]
///
///   [ 0 | 4 | 8 | 1 | 5 | 9 | 2 | 6 | a | 3 | 7 | b ]
/// ```
///
/// Long bands of mixed blocks, and blocks that are not short, are left as is.
pub(super) fn reorder(header: &FrameHeader, channel: &GranuleChannel, buf: &mut [f32; 576]) {
    let is_mixed = match channel.block_type {
        BlockType::Short { is_mixed } => is_mixed,
        _ => return,
    };

    let bands = if is_mixed {
        let switch = SFB_MIXED_SWITCH_POINT[header.sample_rate_idx];
        &SFB_MIXED_BANDS[header.sample_rate_idx][switch..]
    }
    else {
        &SFB_SHORT_BANDS[header.sample_rate_idx][..]
    };

    let start = bands[0];

    let mut reordered = [0f32; 576];

    let mut i = start;

    for band in bands.windows(4).step_by(3) {
        let win0 = &buf[band[0]..band[1]];
        let win1 = &buf[band[1]..band[2]];
        let win2 = &buf[band[2]..band[3]];

        for ((&w0, &w1), &w2) in win0.iter().zip(win1).zip(win2) {
            reordered[i] = w0;
            reordered[i + 1] = w1;
            reordered[i + 2] = w2;
            i += 3;
        }
    }

    buf[start..i].copy_from_slice(&reordered[start..i]);
}

/// Applies the alias reduction butterflies at the boundaries of adjacent long block sub-bands.
///
/// For the boundary at sample j, butterfly i operates on the pair (j - 1 - i, j + i):
///
/// ```text
/// l1 = l0 * cs[i] - u0 * ca[i]
/// u1 = u0 * cs[i] + l0 * ca[i]
/// ```
pub(super) fn antialias(channel: &GranuleChannel, samples: &mut [f32; 576]) {
    let sb_end = match channel.block_type {
        BlockType::Short { is_mixed: false } => return,
        // Only the two long sub-bands of a mixed block.
        BlockType::Short { is_mixed: true } => 2 * 18,
        _ => 32 * 18,
    };

    let (cs, ca): &([f32; 8], [f32; 8]) = &ANTIALIAS_CS_CA;

    for sb in (18..sb_end).step_by(18) {
        for i in 0..8 {
            let li = sb - 1 - i;
            let ui = sb + i;
            let lower = samples[li];
            let upper = samples[ui];
            samples[li] = lower * cs[i] - upper * ca[i];
            samples[ui] = upper * cs[i] + lower * ca[i];
        }
    }
}

/// Performs the IMDCT, windowing, and overlap-add of each sub-band. On return `samples` holds
/// the time domain sub-band samples and `overlap` the second half of each IMDCT for the next
/// granule.
pub(super) fn hybrid_synthesis(
    channel: &GranuleChannel,
    overlap: &mut [[f32; 18]; 32],
    samples: &mut [f32; 576],
) {
    // Sub-bands below this are long blocks.
    let n_long_bands = match channel.block_type {
        BlockType::Short { is_mixed: false } => 0,
        BlockType::Short { is_mixed: true } => 2,
        _ => 32,
    };

    let long_window: &[f32; 36] = match channel.block_type {
        BlockType::Start => &IMDCT_WINDOWS[1],
        BlockType::End => &IMDCT_WINDOWS[3],
        _ => &IMDCT_WINDOWS[0],
    };

    let short_window: &[f32; 36] = &IMDCT_WINDOWS[2];

    let sub_bands = samples.chunks_exact_mut(18).zip(overlap.iter_mut());

    for (sb, (sub_band, overlap)) in sub_bands.enumerate() {
        if sb < n_long_bands {
            imdct36_win(sub_band, long_window, overlap);
        }
        else {
            imdct12_win(sub_band, short_window, overlap);
        }
    }
}

/// The 36-point IMDCT of 18 samples, windowed and overlap-added.
///
/// The IMDCT is computed from an 18-point DCT-IV, `dct`, using its symmetries:
///
/// ```text
/// y[ 0.. 9] =  dct[9..18]
/// y[ 9..27] = -dct[17..=0]
/// y[27..36] = -dct[0..9]
/// ```
fn imdct36_win(x: &mut [f32], window: &[f32; 36], overlap: &mut [f32; 18]) {
    debug_assert!(x.len() == 18);

    let cos: &[[f32; 18]; 18] = &IMDCT36_DCT4;

    let mut dct = [0f32; 18];

    for (d, cos_n) in dct.iter_mut().zip(cos) {
        *d = x.iter().zip(cos_n).map(|(&x, &c)| x * c).sum();
    }

    let mut y = [0f32; 36];

    for (i, y) in y.iter_mut().enumerate() {
        *y = match i {
            0..=8 => dct[i + 9],
            9..=26 => -dct[26 - i],
            _ => -dct[i - 27],
        };
    }

    for i in 0..18 {
        x[i] = y[i] * window[i] + overlap[i];
        overlap[i] = y[i + 18] * window[i + 18];
    }
}

/// The 12-point IMDCT of each of the 3 short windows, windowed, overlapped with each other, and
/// overlap-added. Window w is read from `x[3k + w]`, as left by reordering.
///
/// The three IMDCT outputs are placed 6 samples apart within the 36 sample block:
///
/// ```text
/// 0      6           12           18           24           30     36
/// +------+------------+------------+------------+------------+------+
/// |  0   |  y0[..6]   |  y0[6..]   |  y1[6..]   |  y2[6..]   |  0   |
/// |      |            |  + y1[..6] |  + y2[..6] |            |      |
/// +------+------------+------------+------------+------------+------+
/// ```
fn imdct12_win(x: &mut [f32], window: &[f32; 36], overlap: &mut [f32; 18]) {
    debug_assert!(x.len() == 18);

    let cos: &[[f32; 6]; 12] = &IMDCT12_COS;

    let mut tmp = [0f32; 36];

    for w in 0..3 {
        for (i, cos_i) in cos.iter().enumerate() {
            let y: f32 = cos_i.iter().enumerate().map(|(k, &c)| x[3 * k + w] * c).sum();
            tmp[6 + 6 * w + i] += y * window[i];
        }
    }

    for i in 0..18 {
        x[i] = tmp[i] + overlap[i];
        overlap[i] = tmp[i + 18];
    }
}

/// Negates every odd sample of every odd sub-band.
pub(super) fn frequency_inversion(samples: &mut [f32; 576]) {
    for sub_band in samples.chunks_exact_mut(18).skip(1).step_by(2) {
        for s in sub_band.iter_mut().skip(1).step_by(2) {
            *s = -*s;
        }
    }
}

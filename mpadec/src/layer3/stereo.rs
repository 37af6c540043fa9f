// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Joint stereo decoding: mid-side and intensity stereo.

use std::cmp::max;
use std::{f32, f64};

use lazy_static::lazy_static;
use symphonia_core::errors::{decode_error, Result};

use crate::common::*;
use crate::header::{ChannelMode, FrameHeader};

use super::Granule;

/// The invalid intensity position for MPEG1 bitstreams.
const INTENSITY_INV_POS_MPEG1: u8 = 7;

/// The invalid intensity position for MPEG2 and MPEG2.5 bitstreams. Only the maximum position is
/// invalid.
const INTENSITY_INV_POS_MPEG2: u8 = 31;

lazy_static! {
    /// (Left, right) channel coefficients for intensity stereo in MPEG1 bitstreams, indexed by
    /// is_pos (ISO/IEC 11172-3 section 2.4.3.4.9.3):
    ///
    /// ```text
    /// is_ratio = tan(is_pos * PI/12)
    /// k_l      = is_ratio / (1 + is_ratio)
    /// k_r      =        1 / (1 + is_ratio)
    /// ```
    ///
    /// is_pos == 7 is invalid and has no entry.
    static ref INTENSITY_RATIOS_MPEG1: [(f32, f32); 7] = {
        const PI_12: f64 = f64::consts::PI / 12.0;

        let mut ratios = [(0.0, 0.0); 7];

        for (is_pos, ratio) in ratios.iter_mut().enumerate() {
            let is_ratio = (PI_12 * is_pos as f64).tan();
            *ratio = ((is_ratio / (1.0 + is_ratio)) as f32, (1.0 / (1.0 + is_ratio)) as f32);
        }

        // tan(PI/2) is infinite.
        ratios[6] = (1.0, 0.0);

        ratios
    };

    /// (Left, right) channel coefficients for intensity stereo in MPEG2 bitstreams (ISO/IEC
    /// 13818-3 section 2.4.3.2):
    ///
    /// ```text
    /// is_pos           | k_l                     | k_r
    /// -----------------+-------------------------+-------------------
    /// 0                | 1.0                     | 1.0
    /// odd              | i0 ^ [(is_pos + 1) / 2] | 1.0
    /// even             | 1.0                     | i0 ^ (is_pos / 2)
    /// ```
    ///
    /// The first index is scalefac_compress & 1, selecting i0 = 1/sqrt(sqrt(2)) or 1/sqrt(2).
    /// The second is is_pos. Position 31 is invalid but included.
    static ref INTENSITY_RATIOS_MPEG2: [[(f32, f32); 32]; 2] = {
        let i0: [f64; 2] = [1.0 / f64::sqrt(f64::consts::SQRT_2), f64::consts::FRAC_1_SQRT_2];

        let mut ratios = [[(0.0, 0.0); 32]; 2];

        for (table, &i0) in ratios.iter_mut().zip(&i0) {
            for (is_pos, ratio) in table.iter_mut().enumerate() {
                *ratio = if is_pos & 1 != 0 {
                    (i0.powf((is_pos + 1) as f64 / 2.0) as f32, 1.0)
                }
                else {
                    (1.0, i0.powf(is_pos as f64 / 2.0) as f32)
                };
            }
        }

        ratios
    };
}

/// The coefficient table and invalid position to use for intensity stereo.
struct IntensityTable {
    ratios: &'static [(f32, f32)],
    invalid_pos: u8,
}

impl IntensityTable {
    fn new(header: &FrameHeader, granule: &Granule) -> Self {
        if header.is_mpeg1() {
            IntensityTable {
                ratios: &INTENSITY_RATIOS_MPEG1[..],
                invalid_pos: INTENSITY_INV_POS_MPEG1,
            }
        }
        else {
            let i0 = usize::from(granule.channels[1].scalefac_compress & 1);
            IntensityTable {
                ratios: &INTENSITY_RATIOS_MPEG2[i0][..],
                invalid_pos: INTENSITY_INV_POS_MPEG2,
            }
        }
    }
}

/// Converts mid (channel 0) and side (channel 1) into left and right, in place:
///
/// ```text
/// l[i] = (m[i] + s[i]) / sqrt(2)
/// r[i] = (m[i] - s[i]) / sqrt(2)
/// ```
fn process_mid_side(mid: &mut [f32], side: &mut [f32]) {
    debug_assert!(mid.len() == side.len());

    for (m, s) in mid.iter_mut().zip(side) {
        let left = (*m + *s) * f32::consts::FRAC_1_SQRT_2;
        let right = (*m - *s) * f32::consts::FRAC_1_SQRT_2;
        *m = left;
        *s = right;
    }
}

/// Splits the intensity coded signal in channel 0 into left and right using the coefficients for
/// `is_pos`. A band with an invalid position falls back to mid-side if enabled, or is left as is.
fn process_intensity(
    is_pos: u8,
    table: &IntensityTable,
    mid_side: bool,
    ch0: &mut [f32],
    ch1: &mut [f32],
) {
    if is_pos < table.invalid_pos {
        let (k_l, k_r) = table.ratios[usize::from(is_pos)];

        for (l, r) in ch0.iter_mut().zip(ch1) {
            let is = *l;
            *l = k_l * is;
            *r = k_r * is;
        }
    }
    else if mid_side {
        process_mid_side(ch0, ch1);
    }
}

#[inline(always)]
fn is_zero_band(band: &[f32]) -> bool {
    band.iter().all(|&x| x == 0.0)
}

/// Decodes the intensity coded bands of a long block and returns the intensity bound.
///
/// Every band above the last non-zero band of channel 1 is intensity coded. The scale factors of
/// channel 1 hold the intensity positions.
fn process_intensity_long_block(
    header: &FrameHeader,
    granule: &Granule,
    mid_side: bool,
    max_bound: usize,
    ch0: &mut [f32; 576],
    ch1: &mut [f32; 576],
) -> usize {
    let rzero = granule.channels[1].rzero;

    let table = IntensityTable::new(header, granule);

    let bands = &SFB_LONG_BANDS[header.sample_rate_idx];

    // Band 21 has no scale factor and takes the position of band 20.
    let mut is_pos = [0; 22];
    is_pos.copy_from_slice(&granule.channels[1].scalefacs[..22]);
    is_pos[21] = is_pos[20];

    let mut bound = max_bound;

    for ((&start, &end), &is_pos) in bands.iter().zip(&bands[1..]).zip(&is_pos).rev() {
        // Bands at or above rzero are zero. Those below it must be checked.
        if start < rzero && !is_zero_band(&ch1[start..end]) {
            break;
        }

        process_intensity(is_pos, &table, mid_side, &mut ch0[start..end], &mut ch1[start..end]);

        bound = start;
    }

    bound
}

/// Decodes the intensity coded bands of a short block and returns the intensity bound.
///
/// The three windows of a short block are interleaved band by band, but each window is
/// logically contiguous and has its own intensity bound. A window is intensity coded from the
/// band above its last non-zero band in channel 1. Bands of a window below its bound are mid-side
/// coded, if enabled.
///
/// For a mixed block, if no window reaches its bound within the short bands, the long bands are
/// then processed as for a long block.
fn process_intensity_short_block(
    header: &FrameHeader,
    granule: &Granule,
    is_mixed: bool,
    mid_side: bool,
    max_bound: usize,
    ch0: &mut [f32; 576],
    ch1: &mut [f32; 576],
) -> usize {
    let (short_bands, long_bands, n_sfs) = if is_mixed {
        let bands = SFB_MIXED_BANDS[header.sample_rate_idx];
        let switch = SFB_MIXED_SWITCH_POINT[header.sample_rate_idx];
        (&bands[switch..], &bands[..=switch], bands.len() - 1)
    }
    else {
        (&SFB_SHORT_BANDS[header.sample_rate_idx][..], &[][..], 39)
    };

    let table = IntensityTable::new(header, granule);

    // The last band (three windows) has no scale factors and takes the positions of the band
    // before it.
    let scalefacs = &granule.channels[1].scalefacs;

    let mut is_pos = [0; 39];
    is_pos[..n_sfs - 3].copy_from_slice(&scalefacs[..n_sfs - 3]);
    is_pos[n_sfs - 3..n_sfs].copy_from_slice(&scalefacs[n_sfs - 6..n_sfs - 3]);

    // The short band windows in reverse. Each is paired with its window index and intensity
    // position.
    let n_long = long_bands.len().saturating_sub(1);

    let windows = short_bands.iter().zip(&short_bands[1..]).enumerate().rev();

    let mut window_is_zero = [true; 3];

    let mut bound = max_bound;

    for (i, (&start, &end)) in windows {
        let win = i % 3;

        // Once a window is non-zero, all lower bands of that window are too.
        window_is_zero[win] = window_is_zero[win] && is_zero_band(&ch1[start..end]);

        if window_is_zero[win] {
            let pos = is_pos[n_long + i];
            process_intensity(pos, &table, mid_side, &mut ch0[start..end], &mut ch1[start..end]);
        }
        else if mid_side {
            process_mid_side(&mut ch0[start..end], &mut ch1[start..end]);
        }

        // After the first window of a band, the whole band has been processed.
        if win == 0 {
            bound = start;

            // If every window has reached its bound, the remaining bands are mid-side coded.
            if window_is_zero.iter().all(|&z| !z) {
                return bound;
            }
        }
    }

    // The long bands of a mixed block are below the bound unless every window is zero.
    if window_is_zero.iter().any(|&z| !z) {
        return bound;
    }

    for (sfb, band) in long_bands.windows(2).enumerate().rev() {
        let (start, end) = (band[0], band[1]);

        if !is_zero_band(&ch1[start..end]) {
            break;
        }

        let pos = is_pos[sfb];
        process_intensity(pos, &table, mid_side, &mut ch0[start..end], &mut ch1[start..end]);

        bound = start;
    }

    bound
}

/// Performs joint stereo decoding on the channel pair of a granule.
pub(super) fn stereo(
    header: &FrameHeader,
    granule: &mut Granule,
    ch: &mut [[f32; 576]; 2],
) -> Result<()> {
    let (mid_side, intensity) = match header.channel_mode {
        ChannelMode::JointStereo { mid_side, intensity } => (mid_side, intensity),
        _ => return Ok(()),
    };

    // Both channels must use the same block type.
    if granule.channels[0].block_type != granule.channels[1].block_type {
        return decode_error("mp3: stereo channel pair block_type mismatch");
    }

    let [ch0, ch1] = ch;

    // Samples beyond the larger rzero are zero in both channels.
    let end = max(granule.channels[0].rzero, granule.channels[1].rzero);

    let is_bound = if intensity {
        match granule.channels[1].block_type {
            BlockType::Short { is_mixed } => {
                process_intensity_short_block(header, granule, is_mixed, mid_side, end, ch0, ch1)
            }
            _ => process_intensity_long_block(header, granule, mid_side, end, ch0, ch1),
        }
    }
    else {
        end
    };

    // Everything below the intensity bound is mid-side coded.
    if mid_side && is_bound > 0 {
        process_mid_side(&mut ch0[..is_bound], &mut ch1[..is_bound]);
    }

    // Both channels now carry samples up-to the same point.
    if intensity || mid_side {
        granule.channels[0].rzero = end;
        granule.channels[1].rzero = end;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header;

    /// MPEG1, 44.1 kHz, joint stereo with the given mode extension.
    fn joint_stereo_header(mode_ext: u32) -> FrameHeader {
        header::parse_frame_header(0xfffb_9044 | (mode_ext << 4)).unwrap()
    }

    fn granule(rzero: [usize; 2], block_type: BlockType) -> Granule {
        let mut granule: Granule = Default::default();
        for (channel, &rzero) in granule.channels.iter_mut().zip(&rzero) {
            channel.rzero = rzero;
            channel.block_type = block_type;
        }
        granule
    }

    #[test]
    fn verify_mid_side() {
        let header = joint_stereo_header(0b10);
        let mut granule = granule([576, 576], BlockType::Long);

        let mut ch = [[3.0f32; 576], [1.0f32; 576]];
        stereo(&header, &mut granule, &mut ch).unwrap();

        let sqrt2 = f32::consts::SQRT_2;
        assert!(ch[0].iter().all(|&l| (l - 4.0 / sqrt2).abs() < 1e-5));
        assert!(ch[1].iter().all(|&r| (r - 2.0 / sqrt2).abs() < 1e-5));
    }

    #[test]
    fn verify_intensity_long_block() {
        let header = joint_stereo_header(0b01);

        // Channel 1 is non-zero only in band 0. Band 1 and up are intensity coded.
        let mut granule = granule([576, 4], BlockType::Long);
        granule.channels[1].scalefacs[1..22].fill(6);
        granule.channels[1].scalefacs[2] = 0;

        let mut ch = [[1.0f32; 576], [0.0f32; 576]];
        ch[1][..4].fill(0.5);

        stereo(&header, &mut granule, &mut ch).unwrap();

        // Band 0: untouched, since mid-side is off.
        assert_eq!(&ch[0][..4], &[1.0; 4]);
        assert_eq!(&ch[1][..4], &[0.5; 4]);
        // Band 1 (is_pos 6): all left.
        assert!(ch[0][4..8].iter().all(|&s| s == 1.0));
        assert!(ch[1][4..8].iter().all(|&s| s == 0.0));
        // Band 2 (is_pos 0): all right.
        assert!(ch[0][8..12].iter().all(|&s| s == 0.0));
        assert!(ch[1][8..12].iter().all(|&s| s == 1.0));
        // Band 21 takes band 20's position.
        assert!(ch[0][418..].iter().all(|&s| s == 1.0));

        assert_eq!(granule.channels[0].rzero, 576);
        assert_eq!(granule.channels[1].rzero, 576);
    }

    #[test]
    fn verify_invalid_intensity_position_falls_back_to_mid_side() {
        let header = joint_stereo_header(0b11);

        let mut granule = granule([576, 0], BlockType::Long);
        granule.channels[1].scalefacs[..22].fill(INTENSITY_INV_POS_MPEG1);

        let mut ch = [[1.0f32; 576], [0.0f32; 576]];
        stereo(&header, &mut granule, &mut ch).unwrap();

        let k = f32::consts::FRAC_1_SQRT_2;
        assert!(ch[0].iter().all(|&s| (s - k).abs() < 1e-6));
        assert!(ch[1].iter().all(|&s| (s - k).abs() < 1e-6));
    }

    #[test]
    fn verify_intensity_short_block_per_window_bound() {
        let header = joint_stereo_header(0b01);

        // Window 1 of band 0 (samples 4..8) is non-zero in channel 1. Every other window is
        // zero and intensity coded with is_pos 6.
        let mut granule = granule([576, 8], BlockType::Short { is_mixed: false });
        granule.channels[1].scalefacs[..36].fill(6);

        let mut ch = [[1.0f32; 576], [0.0f32; 576]];
        ch[1][4..8].fill(0.5);

        stereo(&header, &mut granule, &mut ch).unwrap();

        assert!(ch[1][..4].iter().all(|&s| s == 0.0));
        assert!(ch[1][4..8].iter().all(|&s| s == 0.5));
        assert!(ch[0][4..8].iter().all(|&s| s == 1.0));
        assert!(ch[1][8..].iter().all(|&s| s == 0.0));
        assert!(ch[0][8..].iter().all(|&s| s == 1.0));
    }

    #[test]
    fn verify_mpeg2_intensity_ratios() {
        let ratios = &INTENSITY_RATIOS_MPEG2[1];

        assert_eq!(ratios[0], (1.0, 1.0));
        assert!((ratios[1].0 - f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert_eq!(ratios[1].1, 1.0);
        assert_eq!(ratios[2].0, 1.0);
        assert!((ratios[2].1 - f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn verify_block_type_mismatch_is_an_error() {
        let header = joint_stereo_header(0b10);

        let mut granule = granule([576, 576], BlockType::Long);
        granule.channels[1].block_type = BlockType::Start;

        let mut ch = [[0.0f32; 576]; 2];
        assert!(stereo(&header, &mut granule, &mut ch).is_err());
    }

    #[test]
    fn verify_plain_stereo_is_untouched() {
        let header = header::parse_frame_header(0xfffb_9004).unwrap();

        let mut granule = granule([576, 576], BlockType::Long);
        granule.channels[1].block_type = BlockType::End;

        let mut ch = [[3.0f32; 576], [1.0f32; 576]];
        stereo(&header, &mut granule, &mut ch).unwrap();

        assert!(ch[0].iter().all(|&s| s == 3.0));
        assert!(ch[1].iter().all(|&s| s == 1.0));
    }
}

// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Huffman decoding of the spectral samples (part3 of the main data).

use std::cmp::min;

use lazy_static::lazy_static;
use log::debug;
use symphonia_core::errors::{decode_error, Result};
use symphonia_core::io::ReadBitsLtr;

use super::codebooks;
use super::GranuleChannel;

/// Largest magnitude a big_values sample may take: 15 plus 13 linbits.
const MAX_SAMPLE_MAGNITUDE: usize = 15 + (1 << 13) - 1;

lazy_static! {
    /// Lookup table for computing x(i) = s(i)^(4/3) where s(i) is a decoded Huffman sample.
    static ref REQUANTIZE_POW43: Vec<f32> = {
        (0..=MAX_SAMPLE_MAGNITUDE).map(|i| f64::powf(i as f64, 4.0 / 3.0) as f32).collect()
    };
}

/// Reads a sample's linbits extension and sign. Returns |s|^(4/3) with the sign applied, and the
/// number of bits read.
#[inline(always)]
fn read_sample<B: ReadBitsLtr>(
    bs: &mut B,
    pow43: &[f32],
    value: u16,
    linbits: u32,
) -> Result<(f32, u32)> {
    let mut magnitude = usize::from(value);

    if magnitude == 0 {
        return Ok((0.0, 0));
    }

    let mut bits_read = 1;

    if magnitude == 15 && linbits > 0 {
        magnitude += bs.read_bits_leq32(linbits)? as usize;
        bits_read += linbits;
    }

    let sample = pow43[magnitude];

    Ok((if bs.read_bool()? { -sample } else { sample }, bits_read))
}

/// Reads the Huffman coded spectral samples for a channel in a granule into `buf`. At most
/// `part3_bits` bits belong to the channel. Decoding stops once they have all been read.
///
/// Each sample is raised to the (4/3)-rd power. This is the first step of requantization, done
/// here so the integer sample is never stored.
///
/// Returns the number of decoded samples (the starting index of the rzero partition).
pub(super) fn read_huffman_samples<B: ReadBitsLtr>(
    bs: &mut B,
    channel: &GranuleChannel,
    part3_bits: u32,
    buf: &mut [f32; 576],
) -> Result<usize> {
    if part3_bits == 0 {
        buf.fill(0.0);
        return Ok(0);
    }

    let pow43: &[f32] = &REQUANTIZE_POW43;

    let mut bits_read = 0;
    let mut i = 0;

    // Two samples per big_value.
    let big_values_len = 2 * usize::from(channel.big_values);

    let regions: [usize; 3] = [
        min(channel.region1_start, big_values_len),
        min(channel.region2_start, big_values_len),
        min(576, big_values_len),
    ];

    for (region_idx, &region_end) in regions.iter().enumerate() {
        if i >= region_end {
            continue;
        }

        let table = codebooks::big_values_table(channel.table_select[region_idx])?;

        let (codebook, linbits) = match table {
            Some(table) => table,
            None => {
                // Table 0 codes a region of zeros with no bits.
                buf[i..region_end].fill(0.0);
                i = region_end;
                continue;
            }
        };

        while i < region_end && bits_read < part3_bits {
            let (value, code_len) = bs.read_codebook(codebook)?;
            bits_read += code_len;

            let (x, x_len) = read_sample(bs, pow43, value >> 4, linbits)?;
            let (y, y_len) = read_sample(bs, pow43, value & 0xf, linbits)?;
            bits_read += x_len + y_len;

            buf[i] = x;
            buf[i + 1] = y;

            i += 2;
        }
    }

    // The big_values partition must lie within the budget.
    if bits_read > part3_bits {
        return decode_error("mp3: big_values overran part2_3_length");
    }

    let quads = codebooks::quads_table(channel.count1table_select)?;

    while i <= 572 && bits_read < part3_bits {
        let (value, code_len) = bs.read_codebook(quads)?;
        bits_read += code_len;

        // Each quad codes four 1-bit magnitudes v, w, x, y, each followed by a sign bit if set.
        for (j, mask) in [0x8, 0x4, 0x2, 0x1].iter().enumerate() {
            buf[i + j] = if value & mask != 0 {
                bits_read += 1;

                if bs.read_bool()? {
                    -1.0
                }
                else {
                    1.0
                }
            }
            else {
                0.0
            };
        }

        i += 4;
    }

    // Some encoders set part2_3_length a few bits short. The last quad then decodes bits past the
    // budget that do not belong to this channel. Drop it.
    if bits_read > part3_bits {
        debug!("count1 overrun by {} bits, dropping the last quad", bits_read - part3_bits);
        i -= 4;
    }

    buf[i..].fill(0.0);

    Ok(i)
}

// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The frame header codec.
//!
//! Parsing is pure so that the synchronizer may speculatively probe any byte offset.

use std::error;
use std::fmt;

use bitflags::bitflags;

/// The length in bytes of a MPEG frame header word.
pub const MPEG_HEADER_LEN: usize = 4;

/// The maximum length in bytes of a Layer III frame including the header. Reached by MPEG-1 at
/// 320 kbit/s and 32 kHz with padding, and by MPEG-2.5 at 160 kbit/s and 8 kHz with padding.
pub const MAX_MPEG_FRAME_SIZE: usize = 1441;

/// Bit-rate lookup table for MPEG version 1 layer 3.
const BIT_RATES_MPEG1_L3: [u32; 15] = [
    0, 32_000, 40_000, 48_000, 56_000, 64_000, 80_000, 96_000, 112_000, 128_000, 160_000, 192_000,
    224_000, 256_000, 320_000,
];

/// Bit-rate lookup table for MPEG version 2 & 2.5 audio layer 3.
const BIT_RATES_MPEG2_L3: [u32; 15] = [
    0, 8_000, 16_000, 24_000, 32_000, 40_000, 48_000, 56_000, 64_000, 80_000, 96_000, 112_000,
    128_000, 144_000, 160_000,
];

/// Sample rates ordered by the sample rate index used by the scale factor band tables.
pub const SAMPLE_RATES: [u32; 9] =
    [44_100, 48_000, 32_000, 22_050, 24_000, 16_000, 11_025, 12_000, 8_000];

/// The reason a header word was rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeaderError {
    /// The sync word is missing or a reserved field value is used.
    InvalidHeader,
    /// The version field holds the reserved value.
    InvalidVersion,
    /// The bit-rate index is free-format (0) or reserved (15).
    InvalidBitRate,
    /// The layer is reserved or not layer III.
    InvalidLayer,
    /// The sample rate index is reserved.
    InvalidSampleRate,
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            HeaderError::InvalidHeader => "invalid frame header",
            HeaderError::InvalidVersion => "invalid mpeg version",
            HeaderError::InvalidBitRate => "invalid or free-format bit-rate",
            HeaderError::InvalidLayer => "invalid or unsupported layer",
            HeaderError::InvalidSampleRate => "invalid sample rate",
        };
        f.write_str(msg)
    }
}

impl error::Error for HeaderError {}

/// The MPEG audio version.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MpegVersion {
    /// Version 2.5
    Mpeg2p5,
    /// Version 2
    Mpeg2,
    /// Version 1
    Mpeg1,
}

/// The channel mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChannelMode {
    /// Single mono audio channel.
    Mono,
    /// Dual mono audio channels.
    DualMono,
    /// Stereo channels.
    Stereo,
    /// Joint Stereo encoded channels (decodes to Stereo). Layer III may use Mid-Side and
    /// Intensity encoding, either separately or together.
    JointStereo { mid_side: bool, intensity: bool },
}

impl ChannelMode {
    /// Gets the number of channels.
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            ChannelMode::Mono => 1,
            _ => 2,
        }
    }
}

/// The emphasis applied during encoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Emphasis {
    /// No emphasis
    None,
    /// 50/15us
    Fifty15,
    /// CCIT J.17
    CcitJ17,
}

bitflags! {
    /// The single-bit fields of a frame header.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct HeaderFlags: u8 {
        /// The frame is one slot longer than the nominal length.
        const PADDING   = 0x01;
        /// A 16-bit CRC follows the header.
        const CRC       = 0x02;
        /// The private bit.
        const PRIVATE   = 0x04;
        /// The copyright bit.
        const COPYRIGHT = 0x08;
        /// The original/home bit.
        const ORIGINAL  = 0x10;
    }
}

/// A MPEG 1, 2, or 2.5 layer III frame header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub bitrate: u32,
    pub bitrate_idx: u8,
    pub sample_rate: u32,
    pub sample_rate_idx: usize,
    pub channel_mode: ChannelMode,
    pub emphasis: Emphasis,
    pub flags: HeaderFlags,
    /// The total length of the frame in bytes, including the header.
    pub frame_len: usize,
}

impl FrameHeader {
    /// Returns true if this a MPEG1 frame, false otherwise.
    #[inline(always)]
    pub fn is_mpeg1(&self) -> bool {
        self.version == MpegVersion::Mpeg1
    }

    /// Returns true if this a MPEG2.5 frame, false otherwise.
    #[inline(always)]
    pub fn is_mpeg2p5(&self) -> bool {
        self.version == MpegVersion::Mpeg2p5
    }

    #[inline(always)]
    pub fn has_padding(&self) -> bool {
        self.flags.contains(HeaderFlags::PADDING)
    }

    #[inline(always)]
    pub fn has_crc(&self) -> bool {
        self.flags.contains(HeaderFlags::CRC)
    }

    /// Returns the number of granules in the frame.
    #[inline(always)]
    pub fn n_granules(&self) -> usize {
        match self.version {
            MpegVersion::Mpeg1 => 2,
            _ => 1,
        }
    }

    /// Returns the number of channels per granule.
    #[inline(always)]
    pub fn n_channels(&self) -> usize {
        self.channel_mode.count()
    }

    /// Returns the number of audio samples per channel in the frame.
    #[inline(always)]
    pub fn samples_per_frame(&self) -> usize {
        576 * self.n_granules()
    }

    /// Returns the bit-rate in kbit/s.
    #[inline(always)]
    pub fn bitrate_kbps(&self) -> u32 {
        self.bitrate / 1000
    }

    /// Layer III frames are measured in single byte slots.
    #[inline(always)]
    pub fn slot_size(&self) -> usize {
        1
    }

    /// Returns true if Intensity Stereo encoding is used, false otherwise.
    #[inline(always)]
    pub fn is_intensity_stereo(&self) -> bool {
        matches!(self.channel_mode, ChannelMode::JointStereo { intensity: true, .. })
    }

    /// Returns true if Mid-Side Stereo encoding is used, false otherwise.
    #[inline(always)]
    pub fn is_mid_side_stereo(&self) -> bool {
        matches!(self.channel_mode, ChannelMode::JointStereo { mid_side: true, .. })
    }

    /// Get the side information length.
    #[inline(always)]
    pub fn side_info_len(&self) -> usize {
        match (self.version, self.channel_mode) {
            (MpegVersion::Mpeg1, ChannelMode::Mono) => 17,
            (MpegVersion::Mpeg1, _) => 32,
            (_, ChannelMode::Mono) => 9,
            (_, _) => 17,
        }
    }

    /// The offset of the main data from the start of the frame.
    #[inline(always)]
    pub fn main_data_offset(&self) -> usize {
        MPEG_HEADER_LEN + if self.has_crc() { 2 } else { 0 } + self.side_info_len()
    }

    /// Re-encodes the header as a header word.
    pub fn to_word(&self) -> u32 {
        let version = match self.version {
            MpegVersion::Mpeg2p5 => 0b00,
            MpegVersion::Mpeg2 => 0b10,
            MpegVersion::Mpeg1 => 0b11,
        };

        let (mode, mode_ext) = match self.channel_mode {
            ChannelMode::Stereo => (0b00, 0),
            ChannelMode::JointStereo { mid_side, intensity } => {
                (0b01, (u32::from(mid_side) << 1) | u32::from(intensity))
            }
            ChannelMode::DualMono => (0b10, 0),
            ChannelMode::Mono => (0b11, 0),
        };

        let emphasis = match self.emphasis {
            Emphasis::None => 0b00,
            Emphasis::Fifty15 => 0b01,
            Emphasis::CcitJ17 => 0b11,
        };

        let bit = |flag: HeaderFlags| u32::from(self.flags.contains(flag));

        0xffe0_0000
            | version << 19
            | 0b01 << 17
            | (1 - bit(HeaderFlags::CRC)) << 16
            | u32::from(self.bitrate_idx) << 12
            | ((self.sample_rate_idx % 3) as u32) << 10
            | bit(HeaderFlags::PADDING) << 9
            | bit(HeaderFlags::PRIVATE) << 8
            | mode << 6
            | mode_ext << 4
            | bit(HeaderFlags::COPYRIGHT) << 3
            | bit(HeaderFlags::ORIGINAL) << 2
            | emphasis
    }
}

/// Returns true if the provided frame header word is synced.
#[inline(always)]
pub fn is_frame_header_word_synced(sync: u32) -> bool {
    (sync & 0xffe0_0000) == 0xffe0_0000
}

/// Returns true if two headers describe the same stream. Frames of one stream may differ in
/// bit-rate, padding, and stereo mode extension, but never in version, sample rate, or channel
/// count.
#[inline]
pub fn is_frame_header_similar(a: &FrameHeader, b: &FrameHeader) -> bool {
    a.version == b.version && a.sample_rate == b.sample_rate && a.n_channels() == b.n_channels()
}

/// Parses the first four bytes of `buf` as a frame header.
pub fn parse(buf: &[u8]) -> Result<FrameHeader, HeaderError> {
    match buf {
        [a, b, c, d, ..] => parse_frame_header(u32::from_be_bytes([*a, *b, *c, *d])),
        _ => Err(HeaderError::InvalidHeader),
    }
}

pub fn parse_frame_header(header: u32) -> Result<FrameHeader, HeaderError> {
    // The MPEG audio header is structured as follows:
    //
    // 0b1111_1111 0b111v_vlly 0brrrr_hhpx 0bmmmm_coee
    // where:
    //     vv   = version, ll = layer      , y = crc
    //     rrrr = bitrate, hh = sample rate, p = padding , x  = private bit
    //     mmmm = mode   , c  = copyright  , o = original, ee = emphasis

    if !is_frame_header_word_synced(header) {
        return Err(HeaderError::InvalidHeader);
    }

    let version = match (header & 0x18_0000) >> 19 {
        0b00 => MpegVersion::Mpeg2p5,
        0b10 => MpegVersion::Mpeg2,
        0b11 => MpegVersion::Mpeg1,
        _ => return Err(HeaderError::InvalidVersion),
    };

    // Only layer III (0b01) is decoded. Layers I and II are valid MPEG audio, but not for us.
    if (header & 0x6_0000) >> 17 != 0b01 {
        return Err(HeaderError::InvalidLayer);
    }

    let bitrate_idx = ((header & 0xf000) >> 12) as u8;

    let bitrate = match (bitrate_idx, version) {
        // "Free" bit-rate has no derivable frame length. Index 15 is reserved.
        (0b0000, _) | (0b1111, _) => return Err(HeaderError::InvalidBitRate),
        (i, MpegVersion::Mpeg1) => BIT_RATES_MPEG1_L3[usize::from(i)],
        (i, _) => BIT_RATES_MPEG2_L3[usize::from(i)],
    };

    let sample_rate_idx = match ((header & 0xc00) >> 10, version) {
        (0b11, _) => return Err(HeaderError::InvalidSampleRate),
        (i, MpegVersion::Mpeg1) => i as usize,
        (i, MpegVersion::Mpeg2) => 3 + i as usize,
        (i, MpegVersion::Mpeg2p5) => 6 + i as usize,
    };

    let sample_rate = SAMPLE_RATES[sample_rate_idx];

    let channel_mode = match (header & 0xc0) >> 6 {
        0b00 => ChannelMode::Stereo,
        0b01 => ChannelMode::JointStereo {
            mid_side: header & 0x20 != 0x0,
            intensity: header & 0x10 != 0x0,
        },
        0b10 => ChannelMode::DualMono,
        _ => ChannelMode::Mono,
    };

    let emphasis = match header & 0x3 {
        0b00 => Emphasis::None,
        0b01 => Emphasis::Fifty15,
        0b11 => Emphasis::CcitJ17,
        _ => return Err(HeaderError::InvalidHeader),
    };

    let mut flags = HeaderFlags::empty();
    flags.set(HeaderFlags::CRC, header & 0x1_0000 == 0);
    flags.set(HeaderFlags::PADDING, header & 0x200 != 0);
    flags.set(HeaderFlags::PRIVATE, header & 0x100 != 0);
    flags.set(HeaderFlags::COPYRIGHT, header & 0x8 != 0);
    flags.set(HeaderFlags::ORIGINAL, header & 0x4 != 0);

    // Constants provided for size calculation in section ISO-11172 section 2.4.3.1. LSF frames
    // carry a single granule, and so half the samples.
    let factor = match version {
        MpegVersion::Mpeg1 => 144,
        _ => 72,
    };

    // A layer III slot is 1 byte.
    let slot_size = 1;

    let padding = usize::from(flags.contains(HeaderFlags::PADDING));
    let frame_len = ((factor * bitrate / sample_rate) as usize + padding) * slot_size;

    Ok(FrameHeader {
        version,
        bitrate,
        bitrate_idx,
        sample_rate,
        sample_rate_idx,
        channel_mode,
        emphasis,
        flags,
        frame_len,
    })
}

// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Information frames.
//!
//! Encoders may replace the first audio frame of a stream with a frame whose side information is
//! zeroed and whose main data holds a Xing/Info or VBRI tag. These tags carry the number of frames
//! and bytes in the stream and, in the LAME extension of the Xing tag, the encoder delay and
//! padding needed for gapless playback. Information frames decode to silence and are not audio.

use log::debug;
use symphonia_core::checksum::Crc16AnsiLe;
use symphonia_core::io::{BufReader, FiniteStream, Monitor, ReadBytes};

use crate::header::MPEG_HEADER_LEN;
use crate::sync::Frame;

const XING_TAG_ID: [u8; 4] = *b"Xing";
const INFO_TAG_ID: [u8; 4] = *b"Info";
const VBRI_TAG_ID: [u8; 4] = *b"VBRI";

/// The VBRI tag is always at this offset from the start of the frame.
const VBRI_TAG_OFFSET: usize = 36;

/// The delay of the synthesis filterbank and IMDCT, in samples, that encoders account for in the
/// LAME delay and padding fields.
pub const DECODER_DELAY: u32 = 528 + 1;

/// The LAME extension of a Xing/Info tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LameInfo {
    /// The encoder name and version, e.g. "LAME3.100".
    pub encoder: String,
    /// The number of samples to drop at the start of the stream. Includes `DECODER_DELAY`.
    pub delay: u32,
    /// The number of samples to drop at the end of the stream.
    pub padding: u32,
}

/// A Xing or Info tag. "Info" is written by encoders in constant bitrate mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XingInfo {
    pub is_cbr: bool,
    /// The number of audio frames, excluding the information frame.
    pub num_frames: Option<u32>,
    /// The number of bytes in the stream, including the information frame.
    pub num_bytes: Option<u32>,
    /// The seek table: 100 stream positions in 1/256ths of `num_bytes`.
    pub toc: Option<Box<[u8; 100]>>,
    pub quality: Option<u32>,
    /// The LAME extension, if present and its CRC matched.
    pub lame: Option<LameInfo>,
}

/// A VBRI tag, written by the Fraunhofer encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VbriInfo {
    pub num_bytes: u32,
    pub num_frames: u32,
}

/// A parsed information frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InfoFrame {
    Xing(XingInfo),
    Vbri(VbriInfo),
}

impl InfoFrame {
    /// The number of audio frames in the stream, if known.
    pub fn num_frames(&self) -> Option<u32> {
        match self {
            InfoFrame::Xing(xing) => xing.num_frames,
            InfoFrame::Vbri(vbri) => Some(vbri.num_frames),
        }
    }

    /// The number of bytes in the stream, if known.
    pub fn num_bytes(&self) -> Option<u32> {
        match self {
            InfoFrame::Xing(xing) => xing.num_bytes,
            InfoFrame::Vbri(vbri) => Some(vbri.num_bytes),
        }
    }

    /// The LAME extension, if any.
    pub fn lame(&self) -> Option<&LameInfo> {
        match self {
            InfoFrame::Xing(xing) => xing.lame.as_ref(),
            InfoFrame::Vbri(_) => None,
        }
    }
}

/// Tries to read an information frame. Returns `None` if `frame` is an audio frame.
pub fn read_info_frame(frame: &Frame) -> Option<InfoFrame> {
    if let Some(xing) = read_xing_tag(frame) {
        return Some(InfoFrame::Xing(xing));
    }

    read_vbri_tag(frame).map(InfoFrame::Vbri)
}

fn read_xing_tag(frame: &Frame) -> Option<XingInfo> {
    // The side information of an information frame is zeroed.
    if frame.side_info()?.iter().any(|&b| b != 0) {
        return None;
    }

    let buf = &frame.data[..];

    let mut reader = BufReader::new(buf);
    reader.ignore_bytes(frame.header.main_data_offset() as u64).ok()?;

    let id = reader.read_quad_bytes().ok()?;

    if id != XING_TAG_ID && id != INFO_TAG_ID {
        return None;
    }

    let is_cbr = id == INFO_TAG_ID;

    let flags = reader.read_be_u32().ok()?;

    let num_frames = if flags & 0x1 != 0 { Some(reader.read_be_u32().ok()?) } else { None };
    let num_bytes = if flags & 0x2 != 0 { Some(reader.read_be_u32().ok()?) } else { None };

    let toc = if flags & 0x4 != 0 {
        let mut toc = Box::new([0; 100]);
        reader.read_buf_exact(&mut toc[..]).ok()?;
        Some(toc)
    }
    else {
        None
    };

    let quality = if flags & 0x8 != 0 { Some(reader.read_be_u32().ok()?) } else { None };

    let lame = read_lame_extension(buf, &mut reader, frame.header.has_crc());

    Some(XingInfo { is_cbr, num_frames, num_bytes, toc, quality, lame })
}

/// Reads the LAME extension that follows the Xing/Info fields.
fn read_lame_extension(
    buf: &[u8],
    reader: &mut BufReader<'_>,
    has_crc: bool,
) -> Option<LameInfo> {
    /// The full extension length.
    const LAME_EXT_LEN: usize = 36;
    /// The extension length up-to and including the delay and padding.
    const MIN_LAME_EXT_LEN: usize = 24;

    if reader.bytes_available() < MIN_LAME_EXT_LEN as u64 {
        debug!("xing tag too small for lame extension");
        return None;
    }

    let encoder = reader.read_buf_bytes_ref(9).ok()?;

    // Revision and VBR method, lowpass, peak signal amplitude, radio and audiophile replay
    // gain, encoding flags, and ABR bitrate.
    reader.ignore_bytes(1 + 1 + 4 + 2 + 2 + 1 + 1).ok()?;

    let trim = reader.read_be_u24().ok()?;

    let is_lame_like = matches!(&encoder[..4], b"LAME" | b"Lavf" | b"Lavc");

    let (delay, padding) = if is_lame_like {
        let delay = DECODER_DELAY + (trim >> 12);
        let padding = (trim & 0xfff).saturating_sub(DECODER_DELAY);
        (delay, padding)
    }
    else {
        (0, 0)
    };

    // The tag CRC covers every byte of the frame before it. LAME always writes it. Other
    // encoders only do so for protected frames.
    let crc = if reader.bytes_available() >= (LAME_EXT_LEN - MIN_LAME_EXT_LEN) as u64 {
        // Misc, MP3 gain, surround info and preset, music length, and music CRC.
        reader.ignore_bytes(1 + 1 + 2 + 4 + 2).ok()?;

        if has_crc || &encoder[..4] == b"LAME" {
            let end = reader.pos() as usize;
            Some((end, reader.read_be_u16().ok()?))
        }
        else {
            None
        }
    }
    else {
        debug!("xing tag lame extension is truncated");
        None
    };

    if let Some((end, expected)) = crc {
        let mut crc16 = Crc16AnsiLe::new(0);
        crc16.process_buf_bytes(&buf[..end]);

        if crc16.crc() != expected {
            debug!("xing tag lame extension crc mismatch");
            return None;
        }
    }

    Some(LameInfo { encoder: String::from_utf8_lossy(encoder).trim_end().into(), delay, padding })
}

fn read_vbri_tag(frame: &Frame) -> Option<VbriInfo> {
    let buf = &frame.data[..];

    // The bytes between the header and the tag, mostly the side information, are zeroed.
    if buf.get(MPEG_HEADER_LEN..VBRI_TAG_OFFSET)?.iter().any(|&b| b != 0) {
        return None;
    }

    let mut reader = BufReader::new(&buf[VBRI_TAG_OFFSET..]);

    if reader.read_quad_bytes().ok()? != VBRI_TAG_ID {
        return None;
    }

    // Only version 1 exists.
    if reader.read_be_u16().ok()? != 1 {
        return None;
    }

    // Delay and quality.
    reader.ignore_bytes(2 + 2).ok()?;

    let num_bytes = reader.read_be_u32().ok()?;
    let num_frames = reader.read_be_u32().ok()?;

    Some(VbriInfo { num_bytes, num_frames })
}

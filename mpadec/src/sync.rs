// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The frame synchronizer.
//!
//! `SourceReader` splits an arbitrary byte stream into audio frames, tags, and garbage. Every
//! input byte ends up in exactly one emitted item, so the concatenation of all item payloads is
//! the original stream.

use std::io;

use log::{debug, trace, warn};
use symphonia_core::errors::Result;

use crate::header::{self, FrameHeader, MPEG_HEADER_LEN};

/// "ID3"
const ID3V2_MARKER: u32 = 0x49_44_33;
/// "TAG"
const ID3V1_MARKER: u32 = 0x54_41_47;

const ID3V2_HEADER_LEN: usize = 10;
const ID3V2_FOOTER_LEN: usize = 10;
const ID3V1_LEN: usize = 128;

/// The number of bytes requested from the inner reader at a time.
const READ_CHUNK_LEN: usize = 8 * 1024;

/// ID3v2 tags larger than this are emitted in pieces of at most this length.
const MAX_TAG_CHUNK_LEN: usize = 64 * 1024;

/// `SyncOptions` controls the synchronizer's resource limits.
#[derive(Copy, Clone, Debug)]
pub struct SyncOptions {
    /// Consecutive garbage bytes are coalesced into one item of at most this length.
    pub max_garbage_len: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions { max_garbage_len: 64 * 1024 }
    }
}

/// How a frame's boundary was established.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// The frame has its declared length.
    Valid,
    /// The frame's declared padding disagreed with the position of the next header, and the
    /// frame was re-sliced one byte shorter or longer.
    InvalidPaddingCorrected,
}

/// An audio frame: the header and the exact bytes of the frame, header included.
#[derive(Clone, Debug)]
pub struct Frame {
    pub header: FrameHeader,
    pub status: FrameStatus,
    /// The position of the first header byte in the stream.
    pub pos: u64,
    pub data: Box<[u8]>,
}

impl Frame {
    /// The side information, or `None` if the frame is too short to hold it.
    pub fn side_info(&self) -> Option<&[u8]> {
        let start = self.header.main_data_offset() - self.header.side_info_len();
        self.data.get(start..self.header.main_data_offset())
    }

    /// The transmitted CRC-16 check word of a protected frame.
    pub fn crc(&self) -> Option<u16> {
        match self.data.get(MPEG_HEADER_LEN..MPEG_HEADER_LEN + 2) {
            Some(&[hi, lo]) if self.header.has_crc() => Some(u16::from_be_bytes([hi, lo])),
            _ => None,
        }
    }

    /// The main data carried by the frame.
    pub fn main_data(&self) -> &[u8] {
        self.data.get(self.header.main_data_offset()..).unwrap_or(&[])
    }
}

/// The kind of tag found between frames.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TagKind {
    Id3v2,
    Id3v1,
}

/// A metadata tag. The tag is not parsed, only skipped.
#[derive(Clone, Debug)]
pub struct MetaFrame {
    pub kind: TagKind,
    pub pos: u64,
    /// The stream ended before the declared end of the tag.
    pub is_truncated: bool,
    /// The item continues the tag of the previous item. Large tags are split so they are never
    /// buffered whole.
    pub is_continuation: bool,
    pub data: Box<[u8]>,
}

/// A span of bytes that could not be resolved into a frame or tag.
#[derive(Clone, Debug)]
pub struct InvalidFrame {
    pub pos: u64,
    pub data: Box<[u8]>,
}

/// An item produced by the synchronizer.
#[derive(Clone, Debug)]
pub enum SourceFrame {
    Audio(Frame),
    Meta(MetaFrame),
    Invalid(InvalidFrame),
}

impl SourceFrame {
    /// The raw bytes of the item.
    pub fn data(&self) -> &[u8] {
        match self {
            SourceFrame::Audio(frame) => &frame.data,
            SourceFrame::Meta(meta) => &meta.data,
            SourceFrame::Invalid(invalid) => &invalid.data,
        }
    }

    /// The position of the item in the stream.
    pub fn pos(&self) -> u64 {
        match self {
            SourceFrame::Audio(frame) => frame.pos,
            SourceFrame::Meta(meta) => meta.pos,
            SourceFrame::Invalid(invalid) => invalid.pos,
        }
    }
}

/// A `FrameSource` yields frames, tags, and garbage in stream order.
pub trait FrameSource {
    /// Gets the next item, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<SourceFrame>>;

    /// A name identifying the source in diagnostics.
    fn name(&self) -> &str;
}

/// Returns true if `buf` starts with an ID3v2 or ID3v1 marker.
#[inline]
fn is_tag_marker(buf: &[u8]) -> bool {
    buf.starts_with(b"ID3") || buf.starts_with(b"TAG")
}

/// `SourceReader` is the `FrameSource` for a byte stream.
pub struct SourceReader<R: io::Read> {
    inner: R,
    name: String,
    opts: SyncOptions,
    /// Read-ahead buffer. Bytes before `head` have been emitted.
    buf: Vec<u8>,
    head: usize,
    /// The stream position of `buf[head]`.
    pos: u64,
    is_eof: bool,
    garbage: Vec<u8>,
    garbage_pos: u64,
    /// Bytes of the current ID3v2 tag not yet emitted.
    tag_remaining: usize,
    /// An item found directly after garbage, returned once the garbage has been flushed.
    pending: Option<SourceFrame>,
    /// The position at the head of the buffer was predicted by the previous frame.
    is_synced: bool,
}

impl<R: io::Read> SourceReader<R> {
    pub fn new(inner: R, name: &str) -> Self {
        SourceReader::with_options(inner, name, Default::default())
    }

    pub fn with_options(inner: R, name: &str, opts: SyncOptions) -> Self {
        SourceReader {
            inner,
            name: name.to_string(),
            opts: SyncOptions { max_garbage_len: opts.max_garbage_len.max(1) },
            buf: Vec::new(),
            head: 0,
            pos: 0,
            is_eof: false,
            garbage: Vec::new(),
            garbage_pos: 0,
            tag_remaining: 0,
            pending: None,
            is_synced: false,
        }
    }

    /// Unwraps the inner reader. Read-ahead bytes are lost.
    pub fn into_inner(self) -> R {
        self.inner
    }

    #[inline(always)]
    fn unread(&self) -> &[u8] {
        &self.buf[self.head..]
    }

    /// Reads ahead until at least `len` bytes are buffered or the stream ends. Returns the number
    /// of bytes buffered.
    fn fill(&mut self, len: usize) -> Result<usize> {
        if self.unread().len() >= len || self.is_eof {
            return Ok(self.unread().len());
        }

        if self.head > 0 {
            self.buf.drain(..self.head);
            self.head = 0;
        }

        while self.buf.len() < len && !self.is_eof {
            let start = self.buf.len();
            self.buf.resize(start + READ_CHUNK_LEN, 0);

            let res = self.inner.read(&mut self.buf[start..]);

            match res {
                Ok(0) => {
                    self.buf.truncate(start);
                    self.is_eof = true;
                }
                Ok(n) => self.buf.truncate(start + n),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => self.buf.truncate(start),
                Err(err) => {
                    self.buf.truncate(start);
                    return Err(err.into());
                }
            }
        }

        Ok(self.buf.len())
    }

    /// Drops `len` buffered bytes.
    fn advance(&mut self, len: usize) {
        self.head += len;
        self.pos += len as u64;

        if self.head == self.buf.len() {
            self.buf.clear();
            self.head = 0;
        }
    }

    /// Removes `len` buffered bytes.
    fn take(&mut self, len: usize) -> Box<[u8]> {
        let data: Box<[u8]> = self.unread()[..len].into();
        self.advance(len);
        data
    }

    /// Moves `len` buffered bytes to the garbage span.
    fn push_garbage(&mut self, len: usize) {
        if self.garbage.is_empty() {
            self.garbage_pos = self.pos;
        }
        self.garbage.extend_from_slice(&self.buf[self.head..self.head + len]);
        self.advance(len);
    }

    fn flush_garbage(&mut self) -> Option<SourceFrame> {
        if self.garbage.is_empty() {
            return None;
        }

        let data = std::mem::take(&mut self.garbage).into_boxed_slice();

        warn!("{}: skipping {} bytes of garbage at {}", self.name, data.len(), self.garbage_pos);

        Some(SourceFrame::Invalid(InvalidFrame { pos: self.garbage_pos, data }))
    }

    /// Returns true if the 4 bytes at `offset` start a frame of the same stream as `header`, or a
    /// tag.
    fn is_next_frame_start(&self, header: &FrameHeader, offset: usize) -> bool {
        match self.unread().get(offset..offset + MPEG_HEADER_LEN) {
            Some(next) if is_tag_marker(next) => true,
            Some(next) => match header::parse(next) {
                Ok(next) => header::is_frame_header_similar(header, &next),
                Err(_) => false,
            },
            None => false,
        }
    }

    /// Attempts to read an ID3v2 tag at the head of the buffer.
    fn try_id3v2(&mut self) -> Result<Option<SourceFrame>> {
        if self.fill(ID3V2_HEADER_LEN)? < ID3V2_HEADER_LEN {
            return Ok(None);
        }

        let hdr = &self.unread()[..ID3V2_HEADER_LEN];

        // Major and minor version bytes are never 0xff, the size is a 28-bit syncsafe integer.
        if hdr[3] == 0xff || hdr[4] == 0xff || hdr[6..10].iter().any(|&b| b & 0x80 != 0) {
            return Ok(None);
        }

        let size = hdr[6..10].iter().fold(0usize, |acc, &b| (acc << 7) | usize::from(b));
        let has_footer = hdr[5] & 0x10 != 0;

        let total = ID3V2_HEADER_LEN + size + if has_footer { ID3V2_FOOTER_LEN } else { 0 };

        debug!("{}: skipping id3v2 tag of {} bytes at {}", self.name, total, self.pos);

        self.tag_remaining = total;

        self.take_tag_chunk(false).map(Some)
    }

    /// Takes the next piece of the current ID3v2 tag.
    fn take_tag_chunk(&mut self, is_continuation: bool) -> Result<SourceFrame> {
        let chunk_len = self.tag_remaining.min(MAX_TAG_CHUNK_LEN);

        let len = self.fill(chunk_len)?.min(chunk_len);
        let is_truncated = len < chunk_len;

        self.tag_remaining = if is_truncated { 0 } else { self.tag_remaining - len };

        Ok(SourceFrame::Meta(MetaFrame {
            kind: TagKind::Id3v2,
            pos: self.pos,
            is_truncated,
            is_continuation,
            data: self.take(len),
        }))
    }

    /// Attempts to read an ID3v1 tag at the head of the buffer. The marker is only 3 bytes and
    /// may appear inside garbage, so the tag must be followed by the end of the stream, a frame,
    /// or another tag.
    fn try_id3v1(&mut self) -> Result<Option<SourceFrame>> {
        let avail = self.fill(ID3V1_LEN + MPEG_HEADER_LEN)?;

        if avail < ID3V1_LEN {
            return Ok(None);
        }

        if avail >= ID3V1_LEN + MPEG_HEADER_LEN {
            let next = &self.unread()[ID3V1_LEN..ID3V1_LEN + MPEG_HEADER_LEN];
            if !is_tag_marker(next) && header::parse(next).is_err() {
                return Ok(None);
            }
        }

        let pos = self.pos;

        debug!("{}: skipping id3v1 tag at {}", self.name, pos);

        Ok(Some(SourceFrame::Meta(MetaFrame {
            kind: TagKind::Id3v1,
            pos,
            is_truncated: false,
            is_continuation: false,
            data: self.take(ID3V1_LEN),
        })))
    }

    /// Attempts to read an audio frame at the head of the buffer.
    fn try_frame(&mut self) -> Result<Option<SourceFrame>> {
        if self.fill(MPEG_HEADER_LEN)? < MPEG_HEADER_LEN {
            return Ok(None);
        }

        let header = match header::parse(self.unread()) {
            Ok(header) => header,
            Err(err) => {
                trace!("{}: rejected sync word at {}: {}", self.name, self.pos, err);
                return Ok(None);
            }
        };

        let len = header.frame_len;
        let avail = self.fill(len + MPEG_HEADER_LEN)?;

        // A frame cut short by the end of the stream is garbage.
        if avail < len {
            return Ok(None);
        }

        let (len, status, is_confirmed) = if avail < len + MPEG_HEADER_LEN {
            // Nothing, or less than a header, follows the frame.
            (len, FrameStatus::Valid, false)
        }
        else if self.is_next_frame_start(&header, len) {
            (len, FrameStatus::Valid, true)
        }
        else if let Some(alt_len) = self.probe_padding(&header)? {
            warn!(
                "{}: frame at {} has the wrong padding, corrected length {} -> {}",
                self.name, self.pos, len, alt_len
            );
            (alt_len, FrameStatus::InvalidPaddingCorrected, true)
        }
        else if self.is_synced {
            // The previous frame vouched for this header, the next one is likely damaged.
            (len, FrameStatus::Valid, false)
        }
        else {
            return Ok(None);
        };

        self.is_synced = is_confirmed;

        let pos = self.pos;
        trace!("{}: frame at {}, len={}", self.name, pos, len);

        Ok(Some(SourceFrame::Audio(Frame { header, status, pos, data: self.take(len) })))
    }

    /// Heuristic recovery for encoders that set the padding bit incorrectly. If a valid header
    /// is found one byte off the declared frame end, in the direction the padding bit would
    /// move it, that length is used instead. This is a best-effort guess, not a rule of the
    /// bitstream format.
    fn probe_padding(&mut self, header: &FrameHeader) -> Result<Option<usize>> {
        let alt_len =
            if header.has_padding() { header.frame_len - 1 } else { header.frame_len + 1 };

        if self.fill(alt_len + MPEG_HEADER_LEN)? < alt_len + MPEG_HEADER_LEN {
            return Ok(None);
        }

        Ok(if self.is_next_frame_start(header, alt_len) { Some(alt_len) } else { None })
    }

    /// Gets the next frame, tag, or span of garbage.
    pub fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
        if let Some(item) = self.pending.take() {
            return Ok(Some(item));
        }

        if self.tag_remaining > 0 {
            return self.take_tag_chunk(true).map(Some);
        }

        loop {
            if self.garbage.len() >= self.opts.max_garbage_len {
                return Ok(self.flush_garbage());
            }

            let avail = self.fill(3)?;

            if avail == 0 {
                return Ok(self.flush_garbage());
            }
            else if avail < 3 {
                self.push_garbage(avail.min(self.opts.max_garbage_len - self.garbage.len()));
                continue;
            }

            let buf = self.unread();
            let window = u32::from(buf[0]) << 16 | u32::from(buf[1]) << 8 | u32::from(buf[2]);

            let item = if window == ID3V2_MARKER {
                self.try_id3v2()?
            }
            else if window == ID3V1_MARKER {
                self.try_id3v1()?
            }
            else if header::is_frame_header_word_synced(window << 8) {
                self.try_frame()?
            }
            else {
                None
            };

            match item {
                Some(item) => {
                    if let SourceFrame::Meta(_) = item {
                        self.is_synced = false;
                    }

                    match self.flush_garbage() {
                        Some(garbage) => {
                            self.pending = Some(item);
                            return Ok(Some(garbage));
                        }
                        None => return Ok(Some(item)),
                    }
                }
                None => {
                    self.is_synced = false;

                    // Every byte up-to the next possible sync word or tag marker is garbage.
                    let run = self.unread()[1..]
                        .iter()
                        .position(|&b| b == 0xff || b == b'I' || b == b'T')
                        .map_or(self.unread().len(), |i| i + 1);

                    self.push_garbage(run.min(self.opts.max_garbage_len - self.garbage.len()));
                }
            }
        }
    }
}

impl<R: io::Read> FrameSource for SourceReader<R> {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
        SourceReader::next_frame(self)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The decoder session: probing, the pull-based decode loop, and PCM output.

use log::{debug, info, trace, warn};
use symphonia_core::checksum::Crc16Ansi;
use symphonia_core::errors::{
    decode_error, end_of_stream_error, limit_error, unsupported_error, Result,
};
use symphonia_core::io::Monitor;

use crate::header::{ChannelMode, MpegVersion, MPEG_HEADER_LEN};
use crate::info::{self, InfoFrame};
use crate::layer3::{self, FrameOutcome};
use crate::sync::{Frame, FrameSource, FrameStatus, SourceFrame};

/// The sample format of decoded PCM.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SampleFormat {
    /// 32-bit float in [-1.0, 1.0].
    #[default]
    F32,
    /// Signed 16-bit integer.
    S16,
}

/// Interleaved PCM samples.
#[derive(Clone, Debug, PartialEq)]
pub enum PcmSamples {
    F32(Vec<f32>),
    S16(Vec<i16>),
}

impl PcmSamples {
    /// The number of samples over all channels.
    pub fn len(&self) -> usize {
        match self {
            PcmSamples::F32(buf) => buf.len(),
            PcmSamples::S16(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A unit of decoded audio.
#[derive(Clone, Debug)]
pub struct PcmUnit {
    pub sample_rate: u32,
    pub channel_count: usize,
    pub format: SampleFormat,
    /// The index of the first sample frame in the stream timeline.
    pub ts: u64,
    /// The number of sample frames.
    pub dur: u64,
    /// The samples, interleaved with a stride of `channel_count`.
    pub samples: PcmSamples,
}

/// `DecoderOptions` is a common set of options that all decode sessions use.
#[derive(Clone, Debug)]
pub struct DecoderOptions {
    /// The sample format of the produced `PcmUnit`s.
    pub sample_format: SampleFormat,
    /// Per sub-band gains applied in the synthesis filterbank.
    pub equalizer: Option<[f32; 32]>,
    /// Remove the encoder delay and padding given by a LAME tag.
    pub enable_gapless: bool,
    /// Check the CRC of protected frames. A mismatch is a decode error.
    pub verify_crc: bool,
    /// The maximum number of bytes read while probing for the first audio frame.
    pub max_probe_len: u64,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            sample_format: SampleFormat::F32,
            equalizer: None,
            enable_gapless: true,
            verify_crc: false,
            max_probe_len: 1024 * 1024,
        }
    }
}

/// Counters kept over a decode session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Frames that produced PCM.
    pub frames_decoded: u64,
    /// Frames whose boundary was corrected by the padding heuristic.
    pub frames_corrected: u64,
    /// Frames that referenced bits not in the bit reservoir.
    pub frames_skipped: u64,
    /// Frames that failed to decode.
    pub decode_errors: u64,
    /// Xing/Info and VBRI frames.
    pub info_frames: u64,
    /// Bytes that were not part of any frame or tag.
    pub garbage_bytes: u64,
    /// ID3v1 and ID3v2 tags.
    pub tags: u64,
}

/// Parameters of a stream found by `Mp3Decoder::begin_decode`.
#[derive(Clone, Debug)]
pub struct StreamInfo {
    pub version: MpegVersion,
    pub sample_rate: u32,
    pub channel_count: usize,
    pub channel_mode: ChannelMode,
    /// The bitrate of the first audio frame, in bits per second.
    pub bitrate: u32,
    /// The number of sample frames per audio frame.
    pub samples_per_frame: usize,
    /// The number of audio frames, from an information frame.
    pub num_frames: Option<u64>,
    /// The length of the stream in bytes, from an information frame.
    pub num_bytes: Option<u64>,
    /// The encoder that wrote the LAME tag.
    pub encoder: Option<String>,
    /// The encoder delay, in sample frames, including the decoder delay.
    pub delay: Option<u32>,
    /// The encoder padding, in sample frames.
    pub padding: Option<u32>,
}

/// The part of the untrimmed timeline that is output.
#[derive(Copy, Clone, Debug, Default)]
struct Trim {
    start: u64,
    end: Option<u64>,
}

impl Trim {
    /// Returns the range of sample frames to keep from a frame of `len` sample frames that starts
    /// at `pos`.
    fn keep(&self, pos: u64, len: u64) -> (u64, u64) {
        let lo = self.start.saturating_sub(pos).min(len);
        let hi = match self.end {
            Some(end) => end.saturating_sub(pos).min(len),
            None => len,
        };
        (lo, hi.max(lo))
    }
}

/// The MPEG-1/2/2.5 Layer III decoder.
///
/// A session starts with `begin_decode`, which probes the source for the first audio frame.
/// Each call to `decode` then returns the PCM of the next frame that produces any.
pub struct Mp3Decoder<S: FrameSource> {
    opts: DecoderOptions,
    source: Option<S>,
    state: Box<layer3::State>,
    /// The first audio frame, found by the probe.
    pending: Option<Frame>,
    info: Option<StreamInfo>,
    trim: Trim,
    /// The position of the next frame in the untrimmed timeline.
    position: u64,
    stats: DecodeStats,
    buf: Vec<f32>,
}

impl<S: FrameSource> Mp3Decoder<S> {
    pub fn new(opts: DecoderOptions) -> Self {
        Mp3Decoder {
            opts,
            source: None,
            state: Box::new(layer3::State::new()),
            pending: None,
            info: None,
            trim: Default::default(),
            position: 0,
            stats: Default::default(),
            buf: Vec::new(),
        }
    }

    /// Starts a session on `source`. Reads up-to and including the first audio frame, skipping
    /// tags, garbage, and an information frame.
    pub fn begin_decode(&mut self, mut source: S) -> Result<StreamInfo> {
        if self.source.is_some() {
            return unsupported_error("mp3: decode already started");
        }

        self.state.reset();
        self.pending = None;
        self.info = None;
        self.trim = Default::default();
        self.position = 0;
        self.stats = Default::default();

        let mut probed = 0;
        let mut info_frame = None;

        let first = loop {
            let item = match source.next_frame()? {
                Some(item) => item,
                None => {
                    warn!("{}: no audio frame found", source.name());
                    return end_of_stream_error();
                }
            };

            probed += item.data().len() as u64;

            match item {
                SourceFrame::Audio(frame) => match info::read_info_frame(&frame) {
                    Some(found) if info_frame.is_none() => {
                        debug!("found information frame: {:?}", found);
                        self.stats.info_frames += 1;
                        info_frame = Some(found);
                    }
                    Some(_) => {
                        warn!("found a second information frame, skipping");
                        self.stats.info_frames += 1;
                    }
                    None => break frame,
                },
                other => self.account(&other),
            }

            if probed > self.opts.max_probe_len {
                return limit_error("mp3: no audio frame within the probe limit");
            }
        };

        let stream_info = self.make_stream_info(&first, info_frame.as_ref());

        info!(
            "{}: {:?}, {} Hz, {} channel(s), {} kbit/s",
            source.name(),
            stream_info.version,
            stream_info.sample_rate,
            stream_info.channel_count,
            stream_info.bitrate / 1000
        );

        if self.opts.enable_gapless {
            if let Some(delay) = stream_info.delay {
                let end = stream_info.num_frames.map(|n_frames| {
                    let total = n_frames * stream_info.samples_per_frame as u64;
                    total.saturating_sub(u64::from(stream_info.padding.unwrap_or(0)))
                });

                self.trim = Trim { start: u64::from(delay), end };

                debug!("gapless trim: start={}, end={:?}", self.trim.start, self.trim.end);
            }
        }

        self.pending = Some(first);
        self.source = Some(source);
        self.info = Some(stream_info.clone());

        Ok(stream_info)
    }

    fn make_stream_info(&self, first: &Frame, info_frame: Option<&InfoFrame>) -> StreamInfo {
        let header = &first.header;
        let lame = info_frame.and_then(InfoFrame::lame);

        StreamInfo {
            version: header.version,
            sample_rate: header.sample_rate,
            channel_count: header.n_channels(),
            channel_mode: header.channel_mode,
            bitrate: header.bitrate,
            samples_per_frame: header.samples_per_frame(),
            num_frames: info_frame.and_then(InfoFrame::num_frames).map(u64::from),
            num_bytes: info_frame.and_then(InfoFrame::num_bytes).map(u64::from),
            encoder: lame.map(|lame| lame.encoder.clone()),
            delay: lame.map(|lame| lame.delay),
            padding: lame.map(|lame| lame.padding),
        }
    }

    /// Counts and logs a tag or span of garbage.
    fn account(&mut self, item: &SourceFrame) {
        match item {
            SourceFrame::Meta(meta) => {
                debug!("skipping {:?} tag of {} bytes at {}", meta.kind, meta.data.len(), meta.pos);
                if !meta.is_continuation {
                    self.stats.tags += 1;
                }
            }
            SourceFrame::Invalid(garbage) => {
                warn!("skipping {} bytes of garbage at {}", garbage.data.len(), garbage.pos);
                self.stats.garbage_bytes += garbage.data.len() as u64;
            }
            SourceFrame::Audio(_) => (),
        }
    }

    /// Gets the next audio frame from the source.
    fn next_audio_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(frame) = self.pending.take() {
            return Ok(Some(frame));
        }

        loop {
            let item = match self.source.as_mut() {
                Some(source) => source.next_frame()?,
                None => return unsupported_error("mp3: decode not started"),
            };

            match item {
                Some(SourceFrame::Audio(frame)) => return Ok(Some(frame)),
                Some(other) => self.account(&other),
                None => return Ok(None),
            }
        }
    }

    /// Decodes the next frame that produces PCM. Returns `None` once the source is exhausted.
    ///
    /// On a decode error all carried state is reset and the error returned. Decoding may continue
    /// with the next call.
    pub fn decode(&mut self) -> Result<Option<PcmUnit>> {
        if self.source.is_none() {
            return unsupported_error("mp3: decode not started");
        }

        loop {
            let frame = match self.next_audio_frame()? {
                Some(frame) => frame,
                None => return Ok(None),
            };

            if let Some(unit) = self.decode_audio_frame(&frame)? {
                return Ok(Some(unit));
            }
        }
    }

    fn decode_audio_frame(&mut self, frame: &Frame) -> Result<Option<PcmUnit>> {
        let header = &frame.header;

        if frame.status == FrameStatus::InvalidPaddingCorrected {
            warn!("frame at {} was re-sliced by the padding heuristic", frame.pos);
            self.stats.frames_corrected += 1;
        }

        if info::read_info_frame(frame).is_some() {
            warn!("found an unexpected information frame at {}, skipping", frame.pos);
            self.stats.info_frames += 1;
            return Ok(None);
        }

        let n_channels = header.n_channels();
        let len = header.samples_per_frame() as u64;

        let pos = self.position;
        self.position += len;

        trace!("frame at {}: {:?}", frame.pos, header);

        self.buf.clear();
        self.buf.resize(header.samples_per_frame() * n_channels, 0.0);

        let checked = if self.opts.verify_crc { verify_crc(frame) } else { Ok(()) };

        let result = checked.and_then(|_| {
            let equalizer = self.opts.equalizer.as_ref();
            layer3::decode_frame(frame, &mut self.state, equalizer, &mut self.buf)
        });

        match result {
            Ok(FrameOutcome::Decoded) => self.stats.frames_decoded += 1,
            Ok(FrameOutcome::Underflow) => {
                self.stats.frames_skipped += 1;
                return Ok(None);
            }
            Err(err) => {
                warn!("frame at {} failed to decode: {}", frame.pos, err);
                self.state.reset();
                self.stats.decode_errors += 1;
                return Err(err);
            }
        }

        let (lo, hi) = self.trim.keep(pos, len);

        if lo == hi {
            return Ok(None);
        }

        let samples = &self.buf[lo as usize * n_channels..hi as usize * n_channels];

        let samples = match self.opts.sample_format {
            SampleFormat::F32 => PcmSamples::F32(samples.to_vec()),
            SampleFormat::S16 => PcmSamples::S16(samples.iter().map(|&s| f32_to_s16(s)).collect()),
        };

        Ok(Some(PcmUnit {
            sample_rate: header.sample_rate,
            channel_count: n_channels,
            format: self.opts.sample_format,
            ts: (pos + lo).saturating_sub(self.trim.start),
            dur: hi - lo,
            samples,
        }))
    }

    /// Clears the bit reservoir, overlap, and synthesis state. Use after a seek.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Ends the session and returns the source.
    pub fn close(&mut self) -> Option<S> {
        self.pending = None;
        self.info = None;
        self.state.reset();
        self.source.take()
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// The stream parameters found by `begin_decode`.
    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.info.as_ref()
    }
}

/// Checks the CRC of a protected frame.
fn verify_crc(frame: &Frame) -> Result<()> {
    let expected = match frame.crc() {
        Some(crc) => crc,
        None => return Ok(()),
    };

    let (header, side_info) = match (frame.data.get(2..MPEG_HEADER_LEN), frame.side_info()) {
        (Some(header), Some(side_info)) => (header, side_info),
        _ => return decode_error("mp3: frame too short for crc"),
    };

    // The check word covers the last two header bytes and the side information.
    let mut crc = Crc16Ansi::new(0xffff);
    crc.process_buf_bytes(header);
    crc.process_buf_bytes(side_info);

    if crc.crc() != expected {
        return decode_error("mp3: crc mismatch");
    }

    Ok(())
}

#[inline(always)]
fn f32_to_s16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use symphonia_core::errors::Error;
    use crate::sync::{InvalidFrame, MetaFrame, TagKind};

    struct VecSource(VecDeque<SourceFrame>);

    impl FrameSource for VecSource {
        fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
            Ok(self.0.pop_front())
        }

        fn name(&self) -> &str {
            "vec"
        }
    }

    fn garbage(len: usize) -> SourceFrame {
        SourceFrame::Invalid(InvalidFrame { pos: 0, data: vec![0; len].into_boxed_slice() })
    }

    fn tag() -> SourceFrame {
        SourceFrame::Meta(MetaFrame {
            kind: TagKind::Id3v1,
            pos: 0,
            is_truncated: false,
            is_continuation: false,
            data: vec![0; 128].into_boxed_slice(),
        })
    }

    #[test]
    fn verify_decode_before_begin_is_an_error() {
        let mut decoder = Mp3Decoder::<VecSource>::new(Default::default());
        assert!(matches!(decoder.decode(), Err(Error::Unsupported(_))));
    }

    #[test]
    fn verify_begin_decode_without_audio_fails() {
        let mut decoder = Mp3Decoder::new(Default::default());

        let source = VecSource(vec![tag(), garbage(10)].into());

        match decoder.begin_decode(source) {
            Err(Error::IoError(err)) => assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof),
            _ => panic!("expected end of stream"),
        }
        assert_eq!(decoder.stats().tags, 1);
        assert_eq!(decoder.stats().garbage_bytes, 10);
    }

    #[test]
    fn verify_begin_decode_limit() {
        let opts = DecoderOptions { max_probe_len: 100, ..Default::default() };
        let mut decoder = Mp3Decoder::new(opts);

        let source = VecSource(vec![garbage(64), garbage(64), garbage(64)].into());

        assert!(matches!(decoder.begin_decode(source), Err(Error::LimitError(_))));
    }

    #[test]
    fn verify_trim_window() {
        let trim = Trim { start: 1105, end: Some(3000) };

        assert_eq!(trim.keep(0, 1152), (1105, 1152));
        assert_eq!(trim.keep(1152, 1152), (0, 1152));
        assert_eq!(trim.keep(2304, 1152), (0, 696));
        assert_eq!(trim.keep(3456, 1152), (0, 0));

        let trim = Trim::default();
        assert_eq!(trim.keep(0, 576), (0, 576));
    }

    #[test]
    fn verify_s16_conversion() {
        assert_eq!(f32_to_s16(0.0), 0);
        assert_eq!(f32_to_s16(1.0), 32767);
        assert_eq!(f32_to_s16(-1.0), -32767);
        assert_eq!(f32_to_s16(2.0), 32767);
        assert_eq!(f32_to_s16(0.5), 16384);
    }
}

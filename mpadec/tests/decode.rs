// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod common;

use std::io::Cursor;

use mpadec::{DecoderOptions, Error, Mp3Decoder, PcmSamples, SampleFormat, SourceReader};
use symphonia_core::checksum::Crc16Ansi;
use symphonia_core::io::Monitor;

use common::*;

#[test]
fn verify_silence_decodes_to_zero() {
    let decoded = decode_all(silent_frame().repeat(5), Default::default());

    assert_eq!(decoded.units.len(), 5);
    assert_eq!(decoded.errors, 0);
    assert_eq!(decoded.stats.frames_decoded, 5);

    for (i, unit) in decoded.units.iter().enumerate() {
        assert_eq!(unit.sample_rate, 44_100);
        assert_eq!(unit.channel_count, 1);
        assert_eq!(unit.ts, i as u64 * 1152);
        assert_eq!(unit.dur, 1152);
        assert_eq!(unit.samples.len(), 1152);
    }

    assert!(decoded.samples().iter().all(|&s| s == 0.0));
}

#[test]
fn verify_stereo_units_are_interleaved() {
    // MPEG-1, 128 kbit/s, 44.1 kHz, stereo. The side information is 32 bytes.
    let frame = frame([0xff, 0xfb, 0x90, 0x04], &[0; 32], &[]);

    let decoded = decode_all(frame.repeat(3), Default::default());

    assert_eq!(decoded.units.len(), 3);

    for unit in &decoded.units {
        assert_eq!(unit.channel_count, 2);
        assert_eq!(unit.dur, 1152);
        assert_eq!(unit.samples.len(), 2 * 1152);
    }
}

#[test]
fn verify_mpeg2_frames_carry_one_granule() {
    let frame = frame(MPEG2_MONO_HEADER, &[0; 9], &[]);
    assert_eq!(frame.len(), MPEG2_MONO_FRAME_LEN);

    let decoded = decode_all(frame.repeat(4), Default::default());

    assert_eq!(decoded.units.len(), 4);

    for (i, unit) in decoded.units.iter().enumerate() {
        assert_eq!(unit.sample_rate, 22_050);
        assert_eq!(unit.ts, i as u64 * 576);
        assert_eq!(unit.dur, 576);
    }
}

#[test]
fn verify_tone_is_audible_and_bounded() {
    let decoded = decode_all(tone_frame().repeat(6), Default::default());

    assert_eq!(decoded.units.len(), 6);

    let samples = decoded.samples();
    let energy: f32 = samples.iter().map(|s| s * s).sum();

    assert!(energy > 0.0);
    assert!(samples.iter().all(|s| s.abs() <= 1.0));
}

#[test]
fn verify_decoding_is_deterministic() {
    let stream = tone_frame().repeat(4);

    let a = decode_all(stream.clone(), Default::default());
    let b = decode_all(stream, Default::default());

    assert_eq!(a.samples(), b.samples());
}

#[test]
fn verify_main_data_from_the_reservoir() {
    // The second frame's main data is stored at the end of the first frame.
    let mut first = tone_frame();
    let len = first.len();
    first[len - 2..].copy_from_slice(&TONE_MAIN_DATA);

    let second = frame(MONO_HEADER, &mono_side_info(2, [MonoGranule::TONE; 2]), &[]);

    let borrowed = decode_all([first, second].concat(), Default::default());
    let inline = decode_all(tone_frame().repeat(2), Default::default());

    assert_eq!(borrowed.units.len(), 2);
    assert_eq!(borrowed.stats.frames_skipped, 0);
    assert_eq!(borrowed.samples(), inline.samples());
}

#[test]
fn verify_reservoir_underflow_skips_frame() {
    let first = frame(MONO_HEADER, &mono_side_info(100, [MonoGranule::TONE; 2]), &[]);

    let mut stream = first;
    stream.extend(tone_frame().repeat(2));

    let decoded = decode_all(stream, Default::default());

    assert_eq!(decoded.units.len(), 2);
    assert_eq!(decoded.errors, 0);
    assert_eq!(decoded.stats.frames_skipped, 1);
    assert_eq!(decoded.units[0].ts, 1152);
}

#[test]
fn verify_decoding_continues_after_decode_error() {
    // big_values > 288 is invalid.
    let bad_granule = MonoGranule { big_values: 289, ..MonoGranule::SILENT };
    let bad = frame(MONO_HEADER, &mono_side_info(0, [bad_granule; 2]), &[]);

    let stream = [tone_frame(), bad, tone_frame()].concat();

    let mut decoder = Mp3Decoder::new(Default::default());
    decoder.begin_decode(SourceReader::new(Cursor::new(stream), "test")).unwrap();

    let unit = decoder.decode().unwrap().unwrap();
    assert_eq!(unit.ts, 0);

    match decoder.decode() {
        Err(Error::DecodeError(_)) => (),
        other => panic!("expected a decode error, got {:?}", other.map(|u| u.map(|u| u.ts))),
    }

    let unit = decoder.decode().unwrap().unwrap();
    assert_eq!(unit.ts, 2 * 1152);

    assert!(decoder.decode().unwrap().is_none());
    assert_eq!(decoder.stats().decode_errors, 1);
    assert_eq!(decoder.stats().frames_decoded, 2);
}

#[test]
fn verify_corrupt_header_loses_one_frame() {
    let mut stream = tone_frame().repeat(6);

    // Break the sync word of the third frame.
    stream[2 * MONO_FRAME_LEN + 1] = 0x00;

    let decoded = decode_all(stream, Default::default());

    assert_eq!(decoded.units.len(), 5);
    assert_eq!(decoded.errors, 0);
    assert_eq!(decoded.stats.garbage_bytes, MONO_FRAME_LEN as u64);
}

#[test]
fn verify_padding_correction() {
    // The second frame is one byte longer than its header declares.
    let mut stream = tone_frame();
    stream.extend(tone_frame());
    stream.push(0);
    stream.extend(tone_frame().repeat(2));

    let decoded = decode_all(stream, Default::default());
    let reference = decode_all(tone_frame().repeat(4), Default::default());

    assert_eq!(decoded.units.len(), 4);
    assert_eq!(decoded.stats.frames_corrected, 1);
    assert_eq!(decoded.stats.garbage_bytes, 0);
    assert_eq!(decoded.samples(), reference.samples());
}

#[test]
fn verify_tags_are_skipped() {
    let stream = [id3v2_tag(50), silent_frame().repeat(3), id3v1_tag()].concat();

    let decoded = decode_all(stream, Default::default());

    assert_eq!(decoded.units.len(), 3);
    assert_eq!(decoded.stats.tags, 2);
    assert_eq!(decoded.stats.garbage_bytes, 0);
}

#[test]
fn verify_tag_only_stream_has_no_audio() {
    let stream = [id3v2_tag(300), id3v1_tag()].concat();

    let mut decoder = Mp3Decoder::new(Default::default());
    let res = decoder.begin_decode(SourceReader::new(Cursor::new(stream), "test"));

    // The source is exhausted without audio. This is the end of the stream, not a decode error.
    match res {
        Err(Error::IoError(err)) => assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof),
        _ => panic!("expected end of stream"),
    }

    assert_eq!(decoder.stats().tags, 2);
    assert_eq!(decoder.stats().decode_errors, 0);
}

#[test]
fn verify_gapless_trim() {
    // An encoder delay of 576 and padding of 1000 sample frames, stored with the decoder delay.
    let stream = [info_frame(4, 576, 1000 + 529), tone_frame().repeat(4)].concat();

    let mut decoder = Mp3Decoder::new(Default::default());
    let info = decoder.begin_decode(SourceReader::new(Cursor::new(stream), "test")).unwrap();

    assert_eq!(info.num_frames, Some(4));
    assert_eq!(info.num_bytes, Some(5 * MONO_FRAME_LEN as u64));
    assert_eq!(info.encoder.as_deref(), Some("Lavf58.76"));
    assert_eq!(info.delay, Some(576 + 529));
    assert_eq!(info.padding, Some(1000));

    let mut spans = Vec::new();
    while let Some(unit) = decoder.decode().unwrap() {
        assert_eq!(unit.samples.len() as u64, unit.dur);
        spans.push((unit.ts, unit.dur));
    }

    assert_eq!(spans, vec![(0, 47), (47, 1152), (1199, 1152), (2351, 152)]);
    assert_eq!(decoder.stats().info_frames, 1);
    assert_eq!(decoder.stats().frames_decoded, 4);
}

#[test]
fn verify_gapless_can_be_disabled() {
    let stream = [info_frame(4, 576, 1000 + 529), tone_frame().repeat(4)].concat();

    let opts = DecoderOptions { enable_gapless: false, ..Default::default() };
    let decoded = decode_all(stream, opts);

    assert_eq!(decoded.units.len(), 4);
    assert!(decoded.units.iter().all(|unit| unit.dur == 1152));
    assert_eq!(decoded.stats.info_frames, 1);
}

#[test]
fn verify_s16_output_matches_f32() {
    let stream = tone_frame().repeat(3);

    let float = decode_all(stream.clone(), Default::default());

    let opts = DecoderOptions { sample_format: SampleFormat::S16, ..Default::default() };
    let int = decode_all(stream, opts);

    assert_eq!(float.units.len(), int.units.len());

    for (a, b) in float.units.iter().zip(&int.units) {
        assert_eq!(b.format, SampleFormat::S16);

        match (&a.samples, &b.samples) {
            (PcmSamples::F32(a), PcmSamples::S16(b)) => {
                for (&x, &y) in a.iter().zip(b) {
                    assert_eq!((x.clamp(-1.0, 1.0) * 32767.0).round() as i16, y);
                }
            }
            _ => panic!("unexpected sample formats"),
        }
    }
}

#[test]
fn verify_zero_equalizer_mutes_output() {
    let opts = DecoderOptions { equalizer: Some([0.0; 32]), ..Default::default() };
    let decoded = decode_all(tone_frame().repeat(3), opts);

    assert_eq!(decoded.units.len(), 3);
    assert!(decoded.samples().iter().all(|&s| s == 0.0));
}

fn protected_tone_frame(corrupt: bool) -> Vec<u8> {
    let header = [0xff, 0xfa, 0x90, 0xc4];
    let side_info = mono_side_info(0, [MonoGranule::TONE; 2]);

    let mut crc16 = Crc16Ansi::new(0xffff);
    crc16.process_buf_bytes(&header[2..]);
    crc16.process_buf_bytes(&side_info);

    let mut crc = crc16.crc();
    if corrupt {
        crc ^= 1;
    }

    let protected = [&crc.to_be_bytes()[..], &side_info[..]].concat();

    frame(header, &protected, &TONE_MAIN_DATA)
}

#[test]
fn verify_crc_checking() {
    let opts = DecoderOptions { verify_crc: true, ..Default::default() };

    let stream = [protected_tone_frame(false), protected_tone_frame(true)].concat();
    let decoded = decode_all(stream.clone(), opts.clone());

    assert_eq!(decoded.units.len(), 1);
    assert_eq!(decoded.errors, 1);

    // Without checking, both frames decode.
    let decoded = decode_all(stream, Default::default());

    assert_eq!(decoded.units.len(), 2);
    assert_eq!(decoded.errors, 0);

    // Protected and unprotected frames of the same content decode alike.
    let reference = decode_all(tone_frame().repeat(2), Default::default());
    assert_eq!(decoded.samples(), reference.samples());
}

#[test]
fn verify_session_lifecycle() {
    let source = || SourceReader::new(Cursor::new(silent_frame().repeat(2)), "test");

    let mut decoder = Mp3Decoder::new(Default::default());
    decoder.begin_decode(source()).unwrap();

    assert!(matches!(decoder.begin_decode(source()), Err(Error::Unsupported(_))));
    assert_eq!(decoder.stream_info().map(|info| info.sample_rate), Some(44_100));

    assert!(decoder.decode().unwrap().is_some());
    decoder.reset();
    assert!(decoder.decode().unwrap().is_some());

    assert!(decoder.close().is_some());
    assert!(decoder.stream_info().is_none());
    assert!(matches!(decoder.decode(), Err(Error::Unsupported(_))));

    // A closed decoder may start a new session.
    decoder.begin_decode(source()).unwrap();
    assert_eq!(decoder.decode().unwrap().map(|unit| unit.ts), Some(0));
}

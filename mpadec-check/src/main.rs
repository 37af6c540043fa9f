// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Justification: Fields on DecoderOptions may change at any time, always fill in the remaining
// fields with default values.
#![allow(clippy::needless_update)]

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::process::{Child, ChildStdout, Command, Stdio};

use clap::{Parser, ValueEnum};
use log::{info, warn};
use serde::Serialize;

use mpadec::{DecoderOptions, Error, Mp3Decoder, PcmSamples, Result, SourceReader};

/// The absolute maximum allowable sample delta. Around 2^-17 (-102.4dB).
const ABS_MAX_ALLOWABLE_SAMPLE_DELTA: f32 = 0.00001;

#[derive(Copy, Clone, Debug, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum RefDecoder {
    #[default]
    Ffmpeg,
    Mpg123,
}

#[derive(Parser, Debug)]
#[command(name = "mpadec-check", version, about = "Check mpadec output with a reference decoding")]
struct Args {
    /// The decoder used as the reference
    #[arg(long = "ref", value_enum, default_value_t = RefDecoder::Ffmpeg)]
    ref_decoder: RefDecoder,
    /// Print failures per sample
    #[arg(long)]
    samples: bool,
    /// Stop testing after the first failed frame
    #[arg(short = 'f', long = "first-fail")]
    stop_after_fail: bool,
    /// Only print test results
    #[arg(short, long)]
    quiet: bool,
    /// Continue after a decode error (may cause many failures)
    #[arg(long)]
    keep_going: bool,
    /// Disable gapless decoding
    #[arg(long)]
    no_gapless: bool,
    /// Verify the CRC of protected frames
    #[arg(long)]
    crc: bool,
    /// Print the test results as JSON
    #[arg(long)]
    json: bool,
    /// The input file path
    input: String,
}

#[derive(Default, Serialize)]
struct TestResult {
    n_samples: u64,
    n_failed_samples: u64,
    n_frames: u64,
    n_failed_frames: u64,
    /// Samples output by only one of the two decoders.
    n_unmatched_samples: u64,
    n_decode_errors: u64,
    n_skipped_frames: u64,
    n_garbage_bytes: u64,
    abs_max_delta: f32,
}

#[derive(Serialize)]
struct Report<'a> {
    input: &'a str,
    reference: RefDecoder,
    gapless: bool,
    pass: bool,
    result: &'a TestResult,
}

fn build_ffmpeg_command(path: &str, gapless: bool) -> Command {
    let mut cmd = Command::new("ffmpeg");

    // Gapless argument must come before everything else.
    if !gapless {
        cmd.arg("-flags2").arg("skip_manual");
    }

    cmd.arg("-nostats")
        .arg("-hide_banner")
        .arg("-i")
        .arg(path)
        .arg("-map")
        .arg("0:a:0")
        .arg("-c:a")
        .arg("pcm_f32le")
        .arg("-f")
        .arg("f32le")
        .arg("-")
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    cmd
}

fn build_mpg123_command(path: &str, gapless: bool) -> Command {
    let mut cmd = Command::new("mpg123");

    if !gapless {
        cmd.arg("--no-gapless");
    }

    cmd.arg("--quiet")
        .arg("--encoding")
        .arg("f32")
        .arg("--stdout")
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    cmd
}

/// A reference decoder process writing raw little-endian f32 samples to stdout.
struct RefProcess {
    child: Child,
    stdout: BufReader<ChildStdout>,
}

impl RefProcess {
    fn try_spawn(decoder: RefDecoder, gapless: bool, path: &str) -> Result<RefProcess> {
        let mut cmd = match decoder {
            RefDecoder::Ffmpeg => build_ffmpeg_command(path, gapless),
            RefDecoder::Mpg123 => build_mpg123_command(path, gapless),
        };

        let mut child = cmd.spawn()?;

        let stdout = match child.stdout.take() {
            Some(stdout) => BufReader::new(stdout),
            None => {
                return Err(io::Error::new(io::ErrorKind::Other, "reference has no stdout").into())
            }
        };

        info!("spawned reference decoder {:?} (pid {})", decoder, child.id());

        Ok(RefProcess { child, stdout })
    }

    /// Reads the next reference sample, or `None` at the end of the output.
    fn next_sample(&mut self) -> Result<Option<f32>> {
        let mut buf = [0; 4];

        match self.stdout.read_exact(&mut buf) {
            Ok(()) => Ok(Some(f32::from_le_bytes(buf))),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Counts the remaining reference samples.
    fn drain(&mut self) -> Result<u64> {
        let mut n_samples = 0;
        while self.next_sample()?.is_some() {
            n_samples += 1;
        }
        Ok(n_samples)
    }
}

impl Drop for RefProcess {
    fn drop(&mut self) {
        // The process may already have exited.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn samples_as_f32(samples: &PcmSamples) -> Cow<'_, [f32]> {
    match samples {
        PcmSamples::F32(buf) => Cow::Borrowed(buf),
        PcmSamples::S16(buf) => Cow::Owned(buf.iter().map(|&s| f32::from(s) / 32767.0).collect()),
    }
}

fn run_check(
    decoder: &mut Mp3Decoder<SourceReader<BufReader<File>>>,
    reference: &mut RefProcess,
    args: &Args,
    acct: &mut TestResult,
) -> Result<()> {
    let mut is_ref_done = false;

    loop {
        let unit = match decoder.decode() {
            Ok(Some(unit)) => unit,
            Ok(None) => break,
            Err(Error::DecodeError(err)) if args.keep_going => {
                warn!("decode error: {}", err);
                acct.n_decode_errors += 1;
                continue;
            }
            Err(err) => return Err(err),
        };

        let samples = samples_as_f32(&unit.samples);

        // The number of samples previously read and compared.
        let sample_num_base = acct.n_samples;

        // The number of failed samples in the frame.
        let mut n_failed_frame_samples = 0;

        for &t in samples.iter() {
            let r = if is_ref_done { None } else { reference.next_sample()? };

            let r = match r {
                Some(r) => r,
                None => {
                    is_ref_done = true;
                    acct.n_unmatched_samples += 1;
                    continue;
                }
            };

            // Clamp the reference and target samples between [-1.0, 1.0] and find the
            // difference.
            let delta = t.clamp(-1.0, 1.0) - r.clamp(-1.0, 1.0);

            if delta.abs() > ABS_MAX_ALLOWABLE_SAMPLE_DELTA {
                if !args.quiet && (args.samples || n_failed_frame_samples == 0) {
                    println!(
                        "[FAIL] frame={:>6}, ts={:>10}, sample_num={:>12} ({:>4}), \
                         dec={:+.8}, ref={:+.8} ({:+.8})",
                        acct.n_frames,
                        unit.ts,
                        acct.n_samples,
                        acct.n_samples - sample_num_base,
                        t,
                        r,
                        r - t
                    );
                }

                n_failed_frame_samples += 1;
            }

            acct.abs_max_delta = acct.abs_max_delta.max(delta.abs());
            acct.n_samples += 1;
        }

        acct.n_failed_samples += n_failed_frame_samples;
        acct.n_failed_frames += u64::from(n_failed_frame_samples > 0);
        acct.n_frames += 1;

        if args.stop_after_fail && acct.n_failed_frames > 0 {
            return Ok(());
        }
    }

    if !is_ref_done {
        acct.n_unmatched_samples += reference.drain()?;
    }

    Ok(())
}

fn run_test(args: &Args, result: &mut TestResult) -> Result<()> {
    let gapless = !args.no_gapless;

    // 1. Start the reference decoder process.
    let mut reference = RefProcess::try_spawn(args.ref_decoder, gapless, &args.input)?;

    // 2. Open the test target.
    let file = BufReader::new(File::open(&args.input)?);

    let opts =
        DecoderOptions { enable_gapless: gapless, verify_crc: args.crc, ..Default::default() };

    let mut decoder = Mp3Decoder::new(opts);
    decoder.begin_decode(SourceReader::new(file, &args.input))?;

    // 3. Begin check.
    let res = run_check(&mut decoder, &mut reference, args, result);

    let stats = decoder.stats();
    result.n_skipped_frames = stats.frames_skipped;
    result.n_garbage_bytes = stats.garbage_bytes;

    res
}

fn print_results(res: &TestResult) {
    println!("Test Results");
    println!("=================================================");
    println!();
    println!("  Failed/Total Frames:  {:>12}/{:>12}", res.n_failed_frames, res.n_frames);
    println!("  Failed/Total Samples: {:>12}/{:>12}", res.n_failed_samples, res.n_samples);
    println!("  Unmatched Samples:    {:>12}", res.n_unmatched_samples);
    println!("  Decode Errors:        {:>12}", res.n_decode_errors);
    println!("  Skipped Frames:       {:>12}", res.n_skipped_frames);
    println!("  Garbage Bytes:        {:>12}", res.n_garbage_bytes);
    println!();
    println!("  Absolute Maximum Sample Delta:       {:.8}", res.abs_max_delta);
    println!();
}

fn main() {
    pretty_env_logger::init();

    let args = Args::parse();

    let mut res: TestResult = Default::default();

    if !args.json {
        println!("Input Path: {}", args.input);
        println!();
    }

    if let Err(err) = run_test(&args, &mut res) {
        eprintln!("Test interrupted by error: {}", err);
        std::process::exit(2);
    }

    let pass = res.n_failed_samples == 0;

    if args.json {
        let report = Report {
            input: &args.input,
            reference: args.ref_decoder,
            gapless: !args.no_gapless,
            pass,
            result: &res,
        };

        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("Failed to serialize results: {}", err);
                std::process::exit(2);
            }
        }
    }
    else {
        if !args.quiet {
            println!();
        }

        print_results(&res);

        println!("{}", if pass { "PASS" } else { "FAIL" });
        println!();
    }

    std::process::exit(if pass { 0 } else { 1 });
}

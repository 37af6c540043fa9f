// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A pure Rust MPEG-1, MPEG-2, and MPEG-2.5 Layer III (MP3) decoder.
//!
//! ```no_run
//! use mpadec::{Mp3Decoder, SourceReader};
//!
//! # fn main() -> mpadec::Result<()> {
//! let file = std::fs::File::open("song.mp3")?;
//!
//! let mut decoder = Mp3Decoder::new(Default::default());
//! decoder.begin_decode(SourceReader::new(std::io::BufReader::new(file), "song.mp3"))?;
//!
//! while let Some(unit) = decoder.decode()? {
//!     println!("{} sample frames at {}", unit.dur, unit.ts);
//! }
//! # Ok(())
//! # }
//! ```

pub mod decoder;
pub mod header;
pub mod info;
pub mod reservoir;
pub mod sync;

mod common;
mod layer3;
mod synthesis;

pub use decoder::{
    DecodeStats, DecoderOptions, Mp3Decoder, PcmSamples, PcmUnit, SampleFormat, StreamInfo,
};
pub use symphonia_core::errors::{Error, Result};
pub use header::FrameHeader;
pub use sync::{Frame, FrameSource, SourceFrame, SourceReader, SyncOptions};

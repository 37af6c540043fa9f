// mpadec
// Copyright (c) 2024 The mpadec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `BitReservoir` implements the bit reservoir mechanism for main data. Since frames have a
//! deterministic length based on the bit-rate, low-complexity portions of the audio may not need
//! every byte allocated to the frame. The bit reservoir allows these unused portions of frames to
//! be used by the granules of future frames.

use symphonia_core::errors::{decode_error, Result};
use symphonia_core::io::{BitReaderLtr, ReadBitsLtr};

/// The default reservoir capacity in bytes. Must hold the largest back-reference (511 bytes) plus
/// the largest frame.
pub const RESERVOIR_CAPACITY: usize = 4096;

/// The largest back-reference `main_data_begin` can express, in bytes.
pub const MAX_MAIN_DATA_BEGIN: usize = 511;

fn overflow_error<T>() -> Result<T> {
    decode_error("mp3: bit reservoir overflow")
}

/// A bit-addressable buffer with independent read and write cursors.
///
/// Positions reported to the caller are absolute bit positions that only move forward (except by
/// `rewind`). Internally the buffer is linear. When a write does not fit, the bytes wholly before
/// the read cursor are dropped and the rest is moved to the front. Dropped bits can no longer be
/// rewound to.
pub struct BitReservoir {
    buf: Box<[u8]>,
    /// The absolute bit position of `buf[0]`.
    base: u64,
    /// Read cursor, in bits, relative to `buf[0]`.
    read_pos: u64,
    /// Write cursor, in bits, relative to `buf[0]`.
    write_pos: u64,
}

impl Default for BitReservoir {
    fn default() -> Self {
        BitReservoir::new()
    }
}

impl BitReservoir {
    pub fn new() -> Self {
        BitReservoir::with_capacity(RESERVOIR_CAPACITY)
    }

    /// Instantiate a reservoir holding up-to `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        let buf = vec![0u8; capacity.max(1)].into_boxed_slice();
        BitReservoir { buf, base: 0, read_pos: 0, write_pos: 0 }
    }

    #[inline(always)]
    fn capacity_bits(&self) -> u64 {
        8 * self.buf.len() as u64
    }

    /// The absolute position of the read cursor in bits.
    #[inline(always)]
    pub fn read_position(&self) -> u64 {
        self.base + self.read_pos
    }

    /// The absolute position of the write cursor in bits.
    #[inline(always)]
    pub fn write_position(&self) -> u64 {
        self.base + self.write_pos
    }

    /// The number of written bits not yet read.
    #[inline(always)]
    pub fn bits_available(&self) -> u64 {
        self.write_pos - self.read_pos
    }

    /// The unread bytes, starting with the byte holding the read cursor and ending with the last
    /// complete byte written.
    pub fn bytes_ref(&self) -> &[u8] {
        let start = (self.read_pos >> 3) as usize;
        let end = (self.write_pos >> 3) as usize;
        &self.buf[start..end.max(start)]
    }

    /// Makes room for `num_bits` more bits after the write cursor.
    fn reserve(&mut self, num_bits: u64) -> Result<()> {
        if self.write_pos + num_bits <= self.capacity_bits() {
            return Ok(());
        }

        let start = (self.read_pos >> 3) as usize;
        let end = ((self.write_pos + 7) >> 3) as usize;

        self.buf.copy_within(start..end, 0);

        let shift = 8 * start as u64;
        self.base += shift;
        self.read_pos -= shift;
        self.write_pos -= shift;

        if self.write_pos + num_bits > self.capacity_bits() {
            return overflow_error();
        }
        Ok(())
    }

    /// Appends the `bit_width` (<= 32) least-significant bits of `value`, most-significant bit
    /// first.
    pub fn write_bits(&mut self, value: u32, bit_width: u32) -> Result<()> {
        debug_assert!(bit_width <= 32);

        self.reserve(u64::from(bit_width))?;

        for i in (0..bit_width).rev() {
            let idx = (self.write_pos >> 3) as usize;
            let mask = 0x80 >> (self.write_pos & 7);

            if (value >> i) & 1 == 1 {
                self.buf[idx] |= mask;
            }
            else {
                self.buf[idx] &= !mask;
            }

            self.write_pos += 1;
        }

        Ok(())
    }

    /// Appends one byte.
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write_bytes(&[byte])
    }

    /// Appends a slice of bytes. Either all bytes are written, or none are.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(8 * bytes.len() as u64)?;

        if self.write_pos & 7 == 0 {
            let start = (self.write_pos >> 3) as usize;
            self.buf[start..start + bytes.len()].copy_from_slice(bytes);
            self.write_pos += 8 * bytes.len() as u64;
        }
        else {
            for &byte in bytes {
                self.write_bits(u32::from(byte), 8)?;
            }
        }
        Ok(())
    }

    /// Reads `bit_width` (<= 32) bits, most-significant bit first.
    pub fn read_bits_leq32(&mut self, bit_width: u32) -> Result<u32> {
        if u64::from(bit_width) > self.bits_available() {
            return decode_error("mp3: bit reservoir underrun");
        }

        let start = (self.read_pos >> 3) as usize;
        let end = ((self.write_pos + 7) >> 3) as usize;

        let mut bs = BitReaderLtr::new(&self.buf[start..end]);
        bs.ignore_bits((self.read_pos & 7) as u32)?;
        let value = bs.read_bits_leq32(bit_width)?;

        self.read_pos += u64::from(bit_width);
        Ok(value)
    }

    /// Reads a single bit as a boolean.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_bits_leq32(1)? == 1)
    }

    /// Advances the read cursor by `num_bits` without reading them.
    pub fn skip(&mut self, num_bits: u64) -> Result<()> {
        if num_bits > self.bits_available() {
            return decode_error("mp3: skip beyond the end of the bit reservoir");
        }
        self.read_pos += num_bits;
        Ok(())
    }

    /// Moves the read cursor backwards by `num_bits`. The bits must still be stored.
    pub fn rewind(&mut self, num_bits: u64) -> Result<()> {
        if num_bits > self.read_pos {
            return overflow_error();
        }
        self.read_pos -= num_bits;
        Ok(())
    }

    /// Reads `num_bits` from this reservoir and appends them to `dst`, preserving their order.
    pub fn move_bits(&mut self, mut num_bits: u64, dst: &mut BitReservoir) -> Result<()> {
        if num_bits > self.bits_available() {
            return decode_error("mp3: move beyond the end of the bit reservoir");
        }
        dst.reserve(num_bits)?;

        while num_bits > 0 {
            let chunk = num_bits.min(32) as u32;
            let value = self.read_bits_leq32(chunk)?;
            dst.write_bits(value, chunk)?;
            num_bits -= u64::from(chunk);
        }
        Ok(())
    }

    /// Discards the oldest unread bits so that no more than `max_bits` remain unread.
    pub fn retain_unread(&mut self, max_bits: u64) {
        if self.bits_available() > max_bits {
            self.read_pos = self.write_pos - max_bits;
        }
    }

    /// Empties the reservoir.
    pub fn clear(&mut self) {
        self.base = 0;
        self.read_pos = 0;
        self.write_pos = 0;
    }
}

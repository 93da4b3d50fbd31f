//! Raw digitized waveforms and ADC compression.
//!
//! A [`RawDigit`] carries the ADC samples of one channel for one readout
//! window, possibly compressed. The codec implements four schemes:
//!
//! - `Huffman`: delta coding with a prefix code, escape for large jumps;
//! - `ZeroSuppression`: runs of nonzero samples stored as (start, len) blocks;
//! - `ZeroHuffman`: zero suppression followed by Huffman on the block words;
//! - `DynamicDec`: dynamic-range decimation to 8 bits (lossy).
//!
//! All schemes except `DynamicDec` round-trip bit exactly. The compressed
//! stream is a sequence of 16-bit words so it can live in the same payload
//! type as uncompressed samples.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::ids::Channel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// ADC compression schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Compression {
    /// Uncompressed samples.
    None = 0,
    /// Delta coding with a prefix code.
    Huffman = 1,
    /// Nonzero-run block format.
    ZeroSuppression = 2,
    /// Zero suppression followed by Huffman.
    ZeroHuffman = 3,
    /// 8-bit dynamic-range decimation (lossy).
    DynamicDec = 4,
}

impl Compression {
    /// Decodes a persisted compression tag.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Huffman),
            2 => Ok(Compression::ZeroSuppression),
            3 => Ok(Compression::ZeroHuffman),
            4 => Ok(Compression::DynamicDec),
            other => Err(Error::UnknownCompression(other)),
        }
    }
}

/// Raw digitized waveform of a single channel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawDigit {
    /// Readout channel.
    pub channel: Channel,
    /// Number of samples in the uncompressed waveform.
    pub samples: u16,
    /// ADC payload, compressed according to `compression`.
    pub adc: Vec<i16>,
    /// Pedestal level determined online (ADC counts).
    pub pedestal: f64,
    /// Pedestal RMS (ADC counts).
    pub sigma: f64,
    /// Compression scheme of `adc`.
    pub compression: Compression,
}

impl RawDigit {
    /// Creates a digit from uncompressed samples.
    #[must_use]
    pub fn new(channel: Channel, adc: Vec<i16>, pedestal: f64, sigma: f64) -> Self {
        Self {
            channel,
            samples: adc.len() as u16,
            adc,
            pedestal,
            sigma,
            compression: Compression::None,
        }
    }

    /// Creates a digit from an already-compressed payload.
    #[must_use]
    pub fn with_compression(
        channel: Channel,
        samples: u16,
        adc: Vec<i16>,
        pedestal: f64,
        sigma: f64,
        compression: Compression,
    ) -> Self {
        Self {
            channel,
            samples,
            adc,
            pedestal,
            sigma,
            compression,
        }
    }

    /// Recovers the uncompressed waveform.
    pub fn uncompress(&self) -> Result<Vec<i16>> {
        let mut out = vec![0i16; self.samples as usize];
        uncompress(&self.adc, &mut out, self.compression)?;
        Ok(out)
    }
}

/// Compresses a waveform with the given scheme.
#[must_use]
pub fn compress(adc: &[i16], compression: Compression) -> Vec<i16> {
    match compression {
        Compression::None => adc.to_vec(),
        Compression::Huffman => huffman_encode(adc),
        Compression::ZeroSuppression => zero_suppress(adc),
        Compression::ZeroHuffman => {
            let blocks = zero_suppress(adc);
            let mut out = Vec::with_capacity(blocks.len() / 2 + 2);
            out.push(blocks.len() as u16 as i16);
            out.extend(huffman_encode(&blocks));
            out
        }
        Compression::DynamicDec => dynamic_decimate(adc),
    }
}

/// Recovers the original waveform into `out`, whose length must be the
/// uncompressed sample count.
pub fn uncompress(adc_in: &[i16], out: &mut [i16], compression: Compression) -> Result<()> {
    match compression {
        Compression::None => {
            if adc_in.len() != out.len() {
                return Err(Error::CorruptBlock("uncompressed length mismatch"));
            }
            out.copy_from_slice(adc_in);
            Ok(())
        }
        Compression::Huffman => huffman_decode(adc_in, out),
        Compression::ZeroSuppression => zero_unsuppress(adc_in, out),
        Compression::ZeroHuffman => {
            let nwords = adc_in
                .first()
                .map(|&w| w as u16 as usize)
                .ok_or(Error::CorruptBlock("empty zero-huffman payload"))?;
            let mut blocks = vec![0i16; nwords];
            huffman_decode(&adc_in[1..], &mut blocks)?;
            zero_unsuppress(&blocks, out)
        }
        Compression::DynamicDec => dynamic_undecimate(adc_in, out),
    }
}

/// Uncompresses a batch of digits in parallel.
pub fn uncompress_batch(digits: &[RawDigit]) -> Result<Vec<Vec<i16>>> {
    digits.par_iter().map(RawDigit::uncompress).collect()
}

// ---------------------------------------------------------------------------
// Bit-level packing into 16-bit words, MSB first.

struct BitWriter {
    words: Vec<i16>,
    current: u16,
    nbits: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            words: Vec::new(),
            current: 0,
            nbits: 0,
        }
    }

    fn push_bit(&mut self, bit: bool) {
        self.current = (self.current << 1) | u16::from(bit);
        self.nbits += 1;
        if self.nbits == 16 {
            self.words.push(self.current as i16);
            self.current = 0;
            self.nbits = 0;
        }
    }

    fn push_bits(&mut self, value: u16, count: u32) {
        for i in (0..count).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
    }

    fn finish(mut self) -> Vec<i16> {
        if self.nbits > 0 {
            self.current <<= 16 - self.nbits;
            self.words.push(self.current as i16);
        }
        self.words
    }
}

struct BitReader<'a> {
    words: &'a [i16],
    word: usize,
    bit: u32,
}

impl<'a> BitReader<'a> {
    fn new(words: &'a [i16]) -> Self {
        Self {
            words,
            word: 0,
            bit: 0,
        }
    }

    fn next_bit(&mut self) -> Result<bool> {
        let word = *self
            .words
            .get(self.word)
            .ok_or(Error::CorruptBlock("bit stream exhausted"))? as u16;
        let bit = (word >> (15 - self.bit)) & 1 == 1;
        self.bit += 1;
        if self.bit == 16 {
            self.bit = 0;
            self.word += 1;
        }
        Ok(bit)
    }

    fn next_bits(&mut self, count: u32) -> Result<u16> {
        let mut value = 0u16;
        for _ in 0..count {
            value = (value << 1) | u16::from(self.next_bit()?);
        }
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Huffman: first sample raw, then prefix-coded deltas.
//
// A delta of magnitude m <= 6 is m zeros, a terminating one, and (for
// m > 0) a sign bit; seven zeros escape to a raw 16-bit sample.

const HUFF_ESCAPE: u32 = 7;

fn huffman_encode(adc: &[i16]) -> Vec<i16> {
    let mut writer = BitWriter::new();
    let mut prev: Option<i16> = None;
    for &sample in adc {
        match prev {
            None => writer.push_bits(sample as u16, 16),
            Some(p) => {
                let delta = i32::from(sample) - i32::from(p);
                let mag = delta.unsigned_abs();
                if mag <= 6 {
                    for _ in 0..mag {
                        writer.push_bit(false);
                    }
                    writer.push_bit(true);
                    if mag > 0 {
                        writer.push_bit(delta < 0);
                    }
                } else {
                    for _ in 0..HUFF_ESCAPE {
                        writer.push_bit(false);
                    }
                    writer.push_bit(true);
                    writer.push_bits(sample as u16, 16);
                }
            }
        }
        prev = Some(sample);
    }
    writer.finish()
}

fn huffman_decode(words: &[i16], out: &mut [i16]) -> Result<()> {
    if out.is_empty() {
        return Ok(());
    }
    let mut reader = BitReader::new(words);
    let mut prev = reader.next_bits(16)? as i16;
    out[0] = prev;
    for slot in out.iter_mut().skip(1) {
        let mut zeros = 0u32;
        while !reader.next_bit()? {
            zeros += 1;
            if zeros > HUFF_ESCAPE {
                return Err(Error::CorruptBlock("bad huffman prefix"));
            }
        }
        let sample = if zeros == HUFF_ESCAPE {
            reader.next_bits(16)? as i16
        } else if zeros == 0 {
            prev
        } else {
            let negative = reader.next_bit()?;
            let delta = if negative {
                -(zeros as i32)
            } else {
                zeros as i32
            };
            (i32::from(prev) + delta) as i16
        };
        *slot = sample;
        prev = sample;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Zero suppression: [nblocks] then (start, len, payload) per block.
// Suppressed samples are exactly zero, so the round trip is exact.

fn zero_suppress(adc: &[i16]) -> Vec<i16> {
    let mut blocks: Vec<(usize, usize)> = Vec::new();
    let mut start = None;
    for (i, &sample) in adc.iter().enumerate() {
        if sample != 0 {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            blocks.push((s, i - s));
        }
    }
    if let Some(s) = start {
        blocks.push((s, adc.len() - s));
    }

    let mut out = Vec::with_capacity(1 + blocks.iter().map(|&(_, len)| len + 2).sum::<usize>());
    out.push(blocks.len() as u16 as i16);
    for &(start, len) in &blocks {
        out.push(start as u16 as i16);
        out.push(len as u16 as i16);
        out.extend_from_slice(&adc[start..start + len]);
    }
    out
}

fn zero_unsuppress(words: &[i16], out: &mut [i16]) -> Result<()> {
    out.fill(0);
    let nblocks = *words.first().ok_or(Error::CorruptBlock("empty payload"))? as u16;
    let mut pos = 1usize;
    for _ in 0..nblocks {
        if pos + 2 > words.len() {
            return Err(Error::CorruptBlock("truncated block header"));
        }
        let start = words[pos] as u16 as usize;
        let len = words[pos + 1] as u16 as usize;
        pos += 2;
        if pos + len > words.len() || start + len > out.len() {
            return Err(Error::CorruptBlock("block outside waveform"));
        }
        out[start..start + len].copy_from_slice(&words[pos..pos + len]);
        pos += len;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Dynamic-range decimation: shift every sample right so the extremes fit
// in 8 bits, pack two per word. Deliberately lossy.

fn dynamic_decimate(adc: &[i16]) -> Vec<i16> {
    let max_mag = adc.iter().map(|&s| i32::from(s).unsigned_abs()).max().unwrap_or(0);
    let mut shift = 0u32;
    while (max_mag >> shift) > 127 {
        shift += 1;
    }

    let mut out = Vec::with_capacity(1 + adc.len().div_ceil(2));
    out.push(shift as i16);
    for pair in adc.chunks(2) {
        let lo = (i32::from(pair[0]) >> shift) as i8;
        let hi = pair.get(1).map_or(0, |&s| (i32::from(s) >> shift) as i8);
        out.push(i16::from_le_bytes([lo as u8, hi as u8]));
    }
    out
}

fn dynamic_undecimate(words: &[i16], out: &mut [i16]) -> Result<()> {
    let shift = *words.first().ok_or(Error::CorruptBlock("empty payload"))? as u32;
    if words.len() - 1 < out.len().div_ceil(2) {
        return Err(Error::CorruptBlock("truncated decimated payload"));
    }
    for (i, slot) in out.iter_mut().enumerate() {
        let bytes = words[1 + i / 2].to_le_bytes();
        let value = i32::from(bytes[i % 2] as i8) << shift;
        *slot = value as i16;
    }
    Ok(())
}

//! Elias gamma codes packed into a big-endian bitstream.
//!
//! A value `g >= 1` with bit length `N` is written as `N-1` one-bits, a
//! zero-bit, and the `N-1` low bits of `g`. Codes follow each other without
//! alignment; only the end of a whole stream is padded to a byte boundary.

use std::io::{self, Cursor};

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use crate::error::{IndexError, Result};

fn stream_error(e: io::Error) -> IndexError {
    IndexError::MalformedCode(format!("gamma bitstream: {}", e))
}

/// Length of the gamma code for `value` in bits: `2 * floor(log2 value) + 1`
#[inline]
pub fn code_len(value: u32) -> Result<usize> {
    if value == 0 {
        return Err(IndexError::InvalidGammaValue(value));
    }
    Ok(2 * value.ilog2() as usize + 1)
}

/// A packed, byte-padded sequence of gamma codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaStream {
    pub bytes: Vec<u8>,
    /// Number of meaningful bits; the rest of the last byte is padding
    pub bit_len: u64,
}

impl GammaStream {
    /// Decode every code in the stream, stopping at the padding
    pub fn decode_all(&self) -> Result<Vec<u32>> {
        let mut decoder = GammaDecoder::new(&self.bytes);
        let mut values = Vec::new();
        while decoder.bits_read() < self.bit_len {
            values.push(decoder.next_value()?);
        }
        if decoder.bits_read() != self.bit_len {
            return Err(IndexError::MalformedCode(
                "gamma code runs past the end of the stream".into(),
            ));
        }
        Ok(values)
    }
}

/// Packs gamma codes back to back
pub struct GammaEncoder {
    writer: BitWriter<Vec<u8>, BigEndian>,
    bit_len: u64,
}

impl Default for GammaEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl GammaEncoder {
    pub fn new() -> Self {
        Self {
            writer: BitWriter::endian(Vec::new(), BigEndian),
            bit_len: 0,
        }
    }

    pub fn push(&mut self, value: u32) -> Result<()> {
        let len = code_len(value)?;
        let offset_bits = value.ilog2();

        for _ in 0..offset_bits {
            self.writer.write_bit(true).map_err(stream_error)?;
        }
        self.writer.write_bit(false).map_err(stream_error)?;
        if offset_bits > 0 {
            let offset = value & ((1u32 << offset_bits) - 1);
            self.writer
                .write(offset_bits, offset)
                .map_err(stream_error)?;
        }

        self.bit_len += len as u64;
        Ok(())
    }

    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// Pad the last byte with zero bits and hand back the stream
    pub fn finish(mut self) -> Result<GammaStream> {
        self.writer.byte_align().map_err(stream_error)?;
        Ok(GammaStream {
            bytes: self.writer.into_writer(),
            bit_len: self.bit_len,
        })
    }
}

/// Encode a whole sequence into one stream
pub fn encode_all(values: &[u32]) -> Result<GammaStream> {
    let mut encoder = GammaEncoder::new();
    for &value in values {
        encoder.push(value)?;
    }
    encoder.finish()
}

/// Reads gamma codes from a packed stream
pub struct GammaDecoder<'a> {
    reader: BitReader<Cursor<&'a [u8]>, BigEndian>,
    bits_read: u64,
}

impl<'a> GammaDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            reader: BitReader::endian(Cursor::new(bytes), BigEndian),
            bits_read: 0,
        }
    }

    pub fn next_value(&mut self) -> Result<u32> {
        let mut offset_bits: u32 = 0;
        while self.reader.read_bit().map_err(stream_error)? {
            offset_bits += 1;
            if offset_bits > 31 {
                return Err(IndexError::MalformedCode(
                    "gamma length prefix exceeds 31 bits".into(),
                ));
            }
        }

        let offset = if offset_bits > 0 {
            self.reader
                .read::<u32>(offset_bits)
                .map_err(stream_error)?
        } else {
            0
        };

        self.bits_read += 2 * offset_bits as u64 + 1;
        Ok((1u32 << offset_bits) | offset)
    }

    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    /// Check that the codes read so far fill a `len` byte stream, leaving
    /// less than a byte of zero padding
    pub fn finish(mut self, len: usize) -> Result<()> {
        let padding = (len as u64 * 8).saturating_sub(self.bits_read);
        if padding >= 8 {
            return Err(IndexError::MalformedCode(format!(
                "{} bits of trailing data after gamma codes",
                padding
            )));
        }
        if padding > 0 {
            let bits = self
                .reader
                .read::<u8>(padding as u32)
                .map_err(stream_error)?;
            if bits != 0 {
                return Err(IndexError::MalformedCode(
                    "non-zero padding after gamma codes".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Decode exactly `count` values from the start of `bytes`
pub fn decode(bytes: &[u8], count: usize) -> Result<Vec<u32>> {
    let mut decoder = GammaDecoder::new(bytes);
    (0..count).map(|_| decoder.next_value()).collect()
}

/// Render one gamma code as a string of '0'/'1', used in the text index
pub fn to_bit_string(value: u32) -> Result<String> {
    code_len(value)?;
    let offset_bits = value.ilog2() as usize;
    let mut bits = String::with_capacity(2 * offset_bits + 1);
    bits.extend(std::iter::repeat_n('1', offset_bits));
    bits.push('0');
    if offset_bits > 0 {
        // Binary representation without its leading one
        let binary = format!("{:b}", value);
        bits.push_str(&binary[1..]);
    }
    Ok(bits)
}

/// Parse a single gamma code written as a bit string
pub fn from_bit_string(bits: &str) -> Result<u32> {
    let invalid = || IndexError::MalformedCode(format!("invalid gamma code '{}'", bits));

    if !bits.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(invalid());
    }
    let offset_bits = bits.bytes().take_while(|&b| b == b'1').count();
    if offset_bits > 31 || bits.len() != 2 * offset_bits + 1 {
        return Err(invalid());
    }

    let offset = if offset_bits > 0 {
        u32::from_str_radix(&bits[offset_bits + 1..], 2).map_err(|_| invalid())?
    } else {
        0
    };
    Ok((1u32 << offset_bits) | offset)
}

/// Gamma cannot code 0, and the first gap of a posting list is the first doc
/// id, which may be 0. Gamma streams therefore number documents from 1: the
/// first gap is shifted up by one and every later gap is unchanged.
pub fn shift_first_gap(gaps: &[u32]) -> Result<Vec<u32>> {
    let mut shifted = gaps.to_vec();
    if let Some(first) = shifted.first_mut() {
        *first = first.checked_add(1).ok_or_else(|| {
            IndexError::MalformedPostings("first doc id too large for gamma coding".into())
        })?;
    }
    Ok(shifted)
}

/// Inverse of [`shift_first_gap`]
pub fn unshift_first_gap(gaps: &mut [u32]) -> Result<()> {
    if let Some(first) = gaps.first_mut() {
        *first = first.checked_sub(1).ok_or(IndexError::InvalidGammaValue(0))?;
    }
    Ok(())
}

use crate::error::{IndexError, Result};

/// Number of significant bits in `value`; zero still takes one bit
#[inline]
pub fn bit_length(value: u32) -> u32 {
    (32 - value.leading_zeros()).max(1)
}

/// Encoded size in bytes: one byte per 7-bit group
#[inline]
pub fn encoded_len(value: u32) -> usize {
    bit_length(value).div_ceil(7) as usize
}

/// Encode a u32 as a variable-byte code.
///
/// Groups are written most-significant first. Only the last byte carries the
/// high bit, marking the end of the integer.
pub fn encode(value: u32, buf: &mut Vec<u8>) {
    let groups = encoded_len(value);
    for i in (0..groups).rev() {
        let group = ((value >> (7 * i)) & 0x7F) as u8;
        if i == 0 {
            buf.push(group | 0x80);
        } else {
            buf.push(group);
        }
    }
}

/// Encode a sequence of values back to back
pub fn encode_all(values: &[u32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 2);
    for &value in values {
        encode(value, &mut buf);
    }
    buf
}

/// Decode one variable-byte integer from the start of `buf`.
/// Returns (value, bytes_consumed).
pub fn decode(buf: &[u8]) -> Result<(u32, usize)> {
    let mut value: u64 = 0;

    for (i, &byte) in buf.iter().enumerate() {
        value = (value << 7) | (byte & 0x7F) as u64;
        if value > u32::MAX as u64 {
            return Err(IndexError::MalformedCode(
                "variable-byte value exceeds 32 bits".into(),
            ));
        }

        if byte & 0x80 != 0 {
            return Ok((value as u32, i + 1));
        }
    }

    Err(IndexError::MalformedCode(
        "variable-byte code is missing its terminator byte".into(),
    ))
}

/// Decode every integer in `buf`
pub fn decode_all(buf: &[u8]) -> Result<Vec<u32>> {
    let mut values = Vec::new();
    let mut pos = 0;

    while pos < buf.len() {
        let (value, consumed) = decode(&buf[pos..])?;
        values.push(value);
        pos += consumed;
    }

    Ok(values)
}

/// Cursor over a buffer of back-to-back variable-byte codes
pub struct VByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> VByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn next_value(&mut self) -> Result<u32> {
        let (value, consumed) = decode(&self.buf[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

/// Lowercase hex rendering of a byte code, used in the text index
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

pub fn from_hex(hex: &str) -> Result<Vec<u8>> {
    if hex.is_empty() || hex.len() % 2 != 0 {
        return Err(IndexError::MalformedCode(format!("invalid hex code '{}'", hex)));
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| IndexError::MalformedCode(format!("invalid hex code '{}'", hex)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    #[test]
    fn test_gap_five_is_one_byte() {
        let mut buf = Vec::new();
        encode(5, &mut buf);
        assert_eq!(buf, vec![0b1000_0101]);
        assert_eq!(buf[0], 133);
    }

    #[rstest]
    #[case(0, vec![0x80])]
    #[case(127, vec![0xFF])]
    #[case(128, vec![0x01, 0x80])]
    #[case(824, vec![0x06, 0xB8])]
    #[case(16384, vec![0x01, 0x00, 0x80])]
    fn test_known_codes(#[case] value: u32, #[case] expected: Vec<u8>) {
        let mut buf = Vec::new();
        encode(value, &mut buf);
        assert_eq!(buf, expected);
        assert_eq!(decode(&buf).unwrap(), (value, expected.len()));
    }

    #[test]
    fn test_length_matches_bit_groups() {
        for value in [0, 1, 127, 128, 16383, 16384, 2_097_151, 2_097_152, u32::MAX] {
            let mut buf = Vec::new();
            encode(value, &mut buf);
            assert_eq!(buf.len(), encoded_len(value));
            assert_eq!(buf.len(), (bit_length(value) as usize).div_ceil(7));
        }
        assert_eq!(encoded_len(u32::MAX), 5);
    }

    #[test]
    fn test_random_sequences_roundtrip() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let len: usize = rng.random_range(0..200);
            let values: Vec<u32> = (0..len)
                .map(|_| rng.random_range(0..=u32::MAX) >> rng.random_range(0..32u32))
                .collect();
            assert_eq!(decode_all(&encode_all(&values)).unwrap(), values);
        }
    }

    #[test]
    fn test_missing_terminator() {
        assert!(matches!(
            decode(&[0x01, 0x02]),
            Err(IndexError::MalformedCode(_))
        ));
    }

    #[test]
    fn test_overflow() {
        assert!(decode(&[0x7F, 0x7F, 0x7F, 0x7F, 0x7F, 0x80]).is_err());
    }

    #[test]
    fn test_reader_walks_stream() {
        let buf = encode_all(&[3, 300, 0]);
        let mut reader = VByteReader::new(&buf);
        assert_eq!(reader.next_value().unwrap(), 3);
        assert_eq!(reader.next_value().unwrap(), 300);
        assert_eq!(reader.next_value().unwrap(), 0);
        assert_eq!(reader.position(), buf.len());
        assert!(reader.next_value().is_err());
    }

    #[test]
    fn test_hex() {
        assert_eq!(to_hex(&[0x06, 0xB8]), "06b8");
        assert_eq!(from_hex("06b8").unwrap(), vec![0x06, 0xB8]);
        assert!(from_hex("6b8").is_err());
        assert!(from_hex("zz").is_err());
    }
}

//! Byte-alphabet encoders selected by the low bits of the downstream
//! flags byte. `base32`/`base64`/`base64u` wrap the `data-encoding`
//! crate's tables; `base128` has no ecosystem crate at this scope and is
//! hand-rolled as a 7-bit-per-byte packer (see DESIGN.md); `raw` is the
//! identity transform for carriers that tolerate arbitrary bytes.
//!
//! Every encoder but `raw` appends a trailing NUL after its encoded
//! output, not counted in the returned length, mirroring the C-string
//! convention the downstream codec's byte budget already accounts for.

use crate::error::{Error, Result};

/// The encoder capability named in §6: bounded encode/decode plus the
/// length-conversion helpers a caller needs to size its buffers.
pub trait Encoder {
    /// Output bytes needed to encode `raw_len` raw bytes, excluding the
    /// trailing NUL.
    fn get_encoded_length(&self, raw_len: usize) -> usize;

    /// Raw bytes recovered from `encoded_len` encoded bytes.
    fn get_raw_length(&self, encoded_len: usize) -> usize;

    /// Encodes `input` into `out`, returning the encoded byte count
    /// (excluding the trailing NUL the implementation also writes, if
    /// there is room for it).
    fn encode(&self, input: &[u8], out: &mut [u8]) -> Result<usize>;

    /// Decodes `input` into `out`. A trailing NUL in `input`, if present,
    /// terminates the scan early.
    fn decode(&self, input: &[u8], out: &mut [u8]) -> Result<usize>;
}

fn trim_nul(input: &[u8]) -> &[u8] {
    match input.iter().position(|&b| b == 0) {
        Some(i) => &input[..i],
        None => input,
    }
}

macro_rules! data_encoding_wrapper {
    ($name:ident, $table:expr) => {
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl Encoder for $name {
            fn get_encoded_length(&self, raw_len: usize) -> usize {
                $table.encode_len(raw_len)
            }

            fn get_raw_length(&self, encoded_len: usize) -> usize {
                $table.decode_len(encoded_len).unwrap_or(0)
            }

            fn encode(&self, input: &[u8], out: &mut [u8]) -> Result<usize> {
                let needed = self.get_encoded_length(input.len());
                if out.len() < needed + 1 {
                    return Err(Error::BufferTooSmall);
                }
                $table.encode_mut(input, &mut out[..needed]);
                out[needed] = 0;
                Ok(needed)
            }

            fn decode(&self, input: &[u8], out: &mut [u8]) -> Result<usize> {
                let input = trim_nul(input);
                let needed = $table.decode_len(input.len()).map_err(|_| Error::TooShort)?;
                if out.len() < needed {
                    return Err(Error::BufferTooSmall);
                }
                $table
                    .decode_mut(input, &mut out[..needed])
                    .map_err(|_| Error::TooShort)?;
                Ok(needed)
            }
        }
    };
}

data_encoding_wrapper!(Base32, data_encoding::BASE32);
data_encoding_wrapper!(Base64, data_encoding::BASE64);
data_encoding_wrapper!(Base64u, data_encoding::BASE64URL_NOPAD);

/// Hand-rolled 8-bit-alphabet / 7-bits-per-byte packer. No ecosystem
/// crate targets this niche alphabet (see DESIGN.md): each output byte
/// carries 7 payload bits, offset by one so a value of zero is never
/// emitted and the trailing-NUL convention keeps working.
#[derive(Debug, Default, Clone, Copy)]
pub struct Base128;

impl Encoder for Base128 {
    fn get_encoded_length(&self, raw_len: usize) -> usize {
        (raw_len * 8).div_ceil(7)
    }

    fn get_raw_length(&self, encoded_len: usize) -> usize {
        (encoded_len * 7) / 8
    }

    fn encode(&self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        let needed = self.get_encoded_length(input.len());
        if out.len() < needed + 1 {
            return Err(Error::BufferTooSmall);
        }
        let mut acc: u32 = 0;
        let mut bits: u32 = 0;
        let mut o = 0;
        for &b in input {
            acc = (acc << 8) | b as u32;
            bits += 8;
            while bits >= 7 {
                bits -= 7;
                out[o] = (((acc >> bits) & 0x7f) as u8) + 1;
                o += 1;
            }
        }
        if bits > 0 {
            out[o] = (((acc << (7 - bits)) & 0x7f) as u8) + 1;
            o += 1;
        }
        debug_assert_eq!(o, needed);
        out[o] = 0;
        Ok(o)
    }

    fn decode(&self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        let input = trim_nul(input);
        let mut acc: u32 = 0;
        let mut bits: u32 = 0;
        let mut o = 0;
        for &b in input {
            let v = b.checked_sub(1).filter(|&v| v <= 0x7f).ok_or(Error::TooShort)?;
            acc = (acc << 7) | v as u32;
            bits += 7;
            if bits >= 8 {
                bits -= 8;
                if o >= out.len() {
                    return Err(Error::BufferTooSmall);
                }
                out[o] = ((acc >> bits) & 0xff) as u8;
                o += 1;
            }
        }
        Ok(o)
    }
}

/// Identity transform, for carriers that permit arbitrary bytes. Unlike
/// the other encoders it does not append a trailing NUL — there is no
/// alphabet to terminate.
#[derive(Debug, Default, Clone, Copy)]
pub struct Raw;

impl Encoder for Raw {
    fn get_encoded_length(&self, raw_len: usize) -> usize {
        raw_len
    }

    fn get_raw_length(&self, encoded_len: usize) -> usize {
        encoded_len
    }

    fn encode(&self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        if out.len() < input.len() {
            return Err(Error::BufferTooSmall);
        }
        out[..input.len()].copy_from_slice(input);
        Ok(input.len())
    }

    fn decode(&self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        if out.len() < input.len() {
            return Err(Error::BufferTooSmall);
        }
        out[..input.len()].copy_from_slice(input);
        Ok(input.len())
    }
}

/// Which encoder a flags byte's low 3 bits select. `Unset` (anything
/// beyond the five named slots) denotes an unrecognized codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Base32,
    Base64,
    Base64u,
    Base128,
    Raw,
    Unset,
}

impl CodecKind {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => CodecKind::Base32,
            1 => CodecKind::Base64,
            2 => CodecKind::Base64u,
            3 => CodecKind::Base128,
            4 => CodecKind::Raw,
            _ => CodecKind::Unset,
        }
    }

    pub const fn to_bits(self) -> u8 {
        match self {
            CodecKind::Base32 => 0,
            CodecKind::Base64 => 1,
            CodecKind::Base64u => 2,
            CodecKind::Base128 => 3,
            CodecKind::Raw => 4,
            CodecKind::Unset => 7,
        }
    }

    pub fn get_encoded_length(self, raw_len: usize) -> Result<usize> {
        match self {
            CodecKind::Base32 => Ok(Base32.get_encoded_length(raw_len)),
            CodecKind::Base64 => Ok(Base64.get_encoded_length(raw_len)),
            CodecKind::Base64u => Ok(Base64u.get_encoded_length(raw_len)),
            CodecKind::Base128 => Ok(Base128.get_encoded_length(raw_len)),
            CodecKind::Raw => Ok(Raw.get_encoded_length(raw_len)),
            CodecKind::Unset => Err(Error::UnknownCodec),
        }
    }

    pub fn encode(self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        match self {
            CodecKind::Base32 => Base32.encode(input, out),
            CodecKind::Base64 => Base64.encode(input, out),
            CodecKind::Base64u => Base64u.encode(input, out),
            CodecKind::Base128 => Base128.encode(input, out),
            CodecKind::Raw => Raw.encode(input, out),
            CodecKind::Unset => Err(Error::UnknownCodec),
        }
    }

    pub fn decode(self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        match self {
            CodecKind::Base32 => Base32.decode(input, out),
            CodecKind::Base64 => Base64.decode(input, out),
            CodecKind::Base64u => Base64u.decode(input, out),
            CodecKind::Base128 => Base128.decode(input, out),
            CodecKind::Raw => Raw.decode(input, out),
            CodecKind::Unset => Err(Error::UnknownCodec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<E: Encoder>(enc: E, data: &[u8]) {
        let mut encoded = [0u8; 256];
        let n = enc.encode(data, &mut encoded).unwrap();
        let mut decoded = [0u8; 256];
        let m = enc.decode(&encoded[..n], &mut decoded).unwrap();
        assert_eq!(&decoded[..m], data);
    }

    #[test]
    fn base32_round_trips() {
        round_trip(Base32, b"hello, world!");
        round_trip(Base32, b"");
    }

    #[test]
    fn base64_round_trips() {
        round_trip(Base64, b"the quick brown fox");
    }

    #[test]
    fn base64u_round_trips() {
        round_trip(Base64u, &[0xff, 0x00, 0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn base128_round_trips() {
        round_trip(Base128, b"some arbitrary bytes \x01\x02\x03");
        for len in 0..16 {
            let data: Vec<u8> = (0..len as u8).collect();
            round_trip(Base128, &data);
        }
    }

    #[test]
    fn raw_round_trips() {
        round_trip(Raw, &[0u8, 1, 2, 255, 254]);
    }

    #[test]
    fn codec_kind_from_bits_wraps_unknown_to_unset() {
        assert_eq!(CodecKind::from_bits(4), CodecKind::Raw);
        assert_eq!(CodecKind::from_bits(5), CodecKind::Unset);
        assert_eq!(CodecKind::from_bits(6), CodecKind::Unset);
    }
}

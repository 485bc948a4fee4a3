//! The HMAC capability and the source of randomness used when no key is
//! available yet (pre-login envelopes).

use hmac::{Hmac, Mac};
use md5::Md5;

/// `hmac_md5(out16, key, msg)`: the full 16-byte HMAC-MD5 tag. Callers
/// truncate to 4 or 12 bytes themselves.
pub fn hmac_md5(key: &[u8], msg: &[u8]) -> [u8; 16] {
    let mut mac = <Hmac<Md5> as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(msg);
    let tag = mac.finalize().into_bytes();
    let mut out = [0u8; 16];
    out.copy_from_slice(&tag);
    out
}

/// Fills HMAC fields with randomness when an envelope is built before a
/// key has been negotiated. Not in the original capability list — added
/// so `downstream_encode` without a key doesn't need to special-case
/// `no_std` targets that lack an OS RNG.
pub trait RandomSource {
    fn fill(&mut self, buf: &mut [u8]);
}

/// `RandomSource` backed by the operating system's RNG. Only available
/// with the `std` feature, since it needs `getrandom`.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

#[cfg(feature = "std")]
impl RandomSource for OsRandom {
    fn fill(&mut self, buf: &mut [u8]) {
        use rand::RngCore;
        rand::rngs::OsRng.fill_bytes(buf);
    }
}

/// A `RandomSource` that always yields zeros, for deterministic tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRandom;

impl RandomSource for NullRandom {
    fn fill(&mut self, buf: &mut [u8]) {
        buf.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_md5_is_16_bytes_and_key_sensitive() {
        let a = hmac_md5(b"key-one", b"message");
        let b = hmac_md5(b"key-two", b"message");
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }

    #[test]
    fn hmac_md5_is_deterministic() {
        let a = hmac_md5(b"k", b"m");
        let b = hmac_md5(b"k", b"m");
        assert_eq!(a, b);
    }

    #[test]
    fn null_random_fills_zero() {
        let mut r = NullRandom;
        let mut buf = [0xffu8; 4];
        r.fill(&mut buf);
        assert_eq!(buf, [0u8; 4]);
    }
}

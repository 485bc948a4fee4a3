//! The downstream framing codec (§4.5): HMAC-MD5-authenticated,
//! length/flags/CMC-stamped envelopes wrapping one of a small set of
//! byte-alphabet encoders.

pub mod downstream;
pub mod encoding;
pub mod hmac;

pub use downstream::{downstream_decode, downstream_encode, FLAG_CODE_MASK, FLAG_ERROR, FLAG_HMAC32};
pub use encoding::{Base128, Base32, Base64, Base64u, CodecKind, Encoder, Raw};
pub use hmac::{hmac_md5, NullRandom, RandomSource};
#[cfg(feature = "std")]
pub use hmac::OsRandom;

//! Error types for the reliable-delivery engine.
//!
//! This module defines all possible errors that can occur while driving
//! the window buffer or the downstream codec.

use core::fmt;

/// Result type alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Sub-codes carried by an in-band error envelope (the `IS_ANS` class).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsAnsCode {
    /// Authentication failed at the session layer.
    BadAuth,
    /// Envelope length was invalid for its codec.
    BadLen,
    /// Login/session negotiation failed.
    BadLogin,
    /// Unrecognized or malformed options.
    BadOpts,
}

impl IsAnsCode {
    /// Low 3 bits of the flags byte this sub-code is carried in.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x07 {
            0 => Some(IsAnsCode::BadAuth),
            1 => Some(IsAnsCode::BadLen),
            2 => Some(IsAnsCode::BadLogin),
            3 => Some(IsAnsCode::BadOpts),
            _ => None,
        }
    }

    /// Encodes back to the low 3 bits of a flags byte.
    pub const fn to_bits(self) -> u8 {
        match self {
            IsAnsCode::BadAuth => 0,
            IsAnsCode::BadLen => 1,
            IsAnsCode::BadLogin => 2,
            IsAnsCode::BadOpts => 3,
        }
    }
}

/// Error types surfaced by the window buffer and the downstream codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Caller-supplied output buffer is too small for the operation.
    BufferTooSmall,
    /// The window has no free slots (`add_outgoing_data` admission failed).
    WindowFull,
    /// A fragment payload exceeds the configured `maxfraglen`.
    PayloadTooLarge,
    /// A sequence ID referenced a slot outside the active window.
    SequenceOutOfRange,
    /// A fragment collided with an unrelated sequence ID at its slot.
    SequenceCollision,
    /// The flags byte named a codec this build does not provide.
    UnknownCodec,
    /// Envelope shorter than the minimum header it claims to carry.
    TooShort,
    /// HMAC verification failed.
    BadHmac,
    /// In-band error envelope decoded successfully; carries its sub-code.
    IsAns(IsAnsCode),
    /// A fragment exhausted `max_retries` and its slot was freed.
    MaxRetransmitExceeded,
    /// Transport has no data ready right now.
    WouldBlock,
    /// Underlying transport I/O failed.
    IoError,
    /// Operation invalid in the engine's current state.
    InvalidState,
}

impl Error {
    /// Human-readable description, matching the style of `Display`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Error::BufferTooSmall => "buffer too small",
            Error::WindowFull => "window full",
            Error::PayloadTooLarge => "payload too large",
            Error::SequenceOutOfRange => "sequence out of range",
            Error::SequenceCollision => "sequence collision",
            Error::UnknownCodec => "unknown codec",
            Error::TooShort => "envelope too short",
            Error::BadHmac => "hmac mismatch",
            Error::IsAns(_) => "in-band error envelope",
            Error::MaxRetransmitExceeded => "max retransmit exceeded",
            Error::WouldBlock => "would block",
            Error::IoError => "I/O error",
            Error::InvalidState => "invalid state",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

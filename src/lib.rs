//! Reliable-delivery engine for a DNS-tunneling protocol: a
//! bidirectional sliding-window fragmentation layer (`window`, `buffer`,
//! `seq`, `fragment`) and an authenticated downstream framing codec
//! (`codec`) that wraps arbitrary payloads in a length/flags/CMC/HMAC
//! envelope for a lossy, reordering, low-MTU channel.
//!
//! The DNS query/response carrier, CMC generation, login/session
//! negotiation, and CLI/config are all external collaborators and out
//! of this crate's scope; see `transport::Transport` for the narrow
//! seam this crate exposes to whatever carrier a host provides.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod buffer;
pub mod codec;
pub mod config;
pub mod error;
pub mod fragment;
pub mod seq;
pub mod session;
pub mod transport;
pub mod window;

pub use codec::{downstream_decode, downstream_encode, CodecKind, Encoder};
pub use config::{Config, MAX_FRAGSIZE_DOWN, MAX_FRAGSIZE_UP, MAX_SEQ_AHEAD, MAX_SEQ_ID};
pub use error::{Error, IsAnsCode, Result};
pub use fragment::{Direction, FragmentSlot};
pub use session::Session;
pub use transport::Transport;
pub use window::WindowBuffer;

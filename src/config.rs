//! Wire constants and tunable configuration for the engine.

/// Size of the sequence-ID space (ℤ/256ℤ).
pub const MAX_SEQ_ID: u32 = 256;

/// Maximum fragment payload size on the downstream (server->client) path.
pub const MAX_FRAGSIZE_DOWN: usize = 2048;

/// Maximum fragment payload size on the upstream (client->server) path.
pub const MAX_FRAGSIZE_UP: usize = 255;

/// A fragment whose forward distance from the window's base exceeds this
/// is treated as stale rather than far-future (I1).
pub const MAX_SEQ_AHEAD: u8 = 128;

/// Tunable parameters shared by a sending or receiving `WindowBuffer`.
///
/// `Config` carries only the values the window and codec actually consult;
/// ring capacity and per-fragment buffer size are const generics on the
/// types themselves, since they govern fixed-size storage.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Maximum fragments in flight (`windowsize`).
    pub window_size: u16,
    /// Resend deadline in caller-defined time units (ms, typically).
    pub timeout: u64,
    /// Maximum send attempts before a fragment's slot is freed.
    pub max_retries: u16,
    /// Select 4-byte (HMAC32) instead of 12-byte HMAC truncation by default.
    pub hmac32: bool,
}

impl Config {
    /// Reasonable defaults for a DNS-tunneling-scale channel.
    pub const fn new() -> Self {
        Self {
            window_size: 32,
            timeout: 1000,
            max_retries: 3,
            hmac32: false,
        }
    }

    /// Tighter timeout / fewer retries, for low-latency carriers.
    pub const fn low_latency() -> Self {
        Self {
            window_size: 16,
            timeout: 250,
            max_retries: 5,
            hmac32: true,
        }
    }

    /// Looser timeout / more patience, for high-latency carriers
    /// (e.g. DNS resolvers several hops away).
    pub const fn high_latency() -> Self {
        Self {
            window_size: 64,
            timeout: 4000,
            max_retries: 2,
            hmac32: false,
        }
    }

    pub const fn with_window_size(mut self, window_size: u16) -> Self {
        self.window_size = window_size;
        self
    }

    pub const fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn with_max_retries(mut self, max_retries: u16) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let cfg = Config::default();
        assert!(cfg.window_size > 0);
        assert!(cfg.timeout > 0);
    }

    #[test]
    fn builder_overrides_fields() {
        let cfg = Config::new().with_window_size(8).with_max_retries(1);
        assert_eq!(cfg.window_size, 8);
        assert_eq!(cfg.max_retries, 1);
    }
}

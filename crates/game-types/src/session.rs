//! Session identity derived from a connected wallet address.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-wallet identifier of one play-through.
///
/// The id is derived deterministically from the wallet address so that the
/// same wallet always resumes the same on-chain session, including across
/// page reloads and process restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameId(u64);

impl GameId {
    /// Sentinel for "no wallet connected".
    pub const ZERO: GameId = GameId(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Derives the session identifier from a wallet address.
    ///
    /// Wire contract: the id is the first 16 hex digits after the `0x`
    /// prefix, read as a base-16 integer. The slice is fixed so the mapping
    /// is stable for the lifetime of the address; the empty or malformed
    /// address maps to [`GameId::ZERO`].
    pub fn from_address(address: &str) -> Self {
        if !address.is_ascii() {
            return Self::ZERO;
        }

        let hex_part = address.strip_prefix("0x").unwrap_or(address);
        if hex_part.is_empty() {
            return Self::ZERO;
        }

        let slice = &hex_part[..hex_part.len().min(16)];
        match u64::from_str_radix(slice, 16) {
            Ok(raw) => Self(raw),
            Err(_) => Self::ZERO,
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let address = "0x04a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f5a6b7c8d9e0f1a2";
        let first = GameId::from_address(address);
        let second = GameId::from_address(address);
        assert_eq!(first, second);
        assert!(!first.is_zero());
    }

    #[test]
    fn derivation_uses_first_sixteen_hex_digits() {
        // 0x0000000000003039 == 12345; trailing digits must not matter.
        let id = GameId::from_address("0x0000000000003039deadbeefdeadbeef");
        assert_eq!(id, GameId::new(12345));
        assert_eq!(id.to_string(), "12345");
    }

    #[test]
    fn empty_address_maps_to_sentinel() {
        assert_eq!(GameId::from_address(""), GameId::ZERO);
        assert_eq!(GameId::from_address("0x"), GameId::ZERO);
    }

    #[test]
    fn malformed_address_maps_to_sentinel() {
        assert_eq!(GameId::from_address("0xnothex"), GameId::ZERO);
        assert_eq!(GameId::from_address("0x🦀"), GameId::ZERO);
    }

    #[test]
    fn short_address_is_accepted() {
        assert_eq!(GameId::from_address("0xff"), GameId::new(255));
    }
}

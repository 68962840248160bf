use std::fmt;
use std::str::FromStr;

use crate::error::CommandError;

/// 4-byte session token echoed between station and gateway.
///
/// Rendered as 8 lowercase hex characters at the HTTP boundary.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Token(pub [u8; 4]);

impl Token {
    pub const LEN: usize = 4;

    /// Build a token from the bytes at hand, zero-padding if fewer than 4.
    pub fn from_prefix(bytes: &[u8]) -> Self {
        let mut token = [0u8; Self::LEN];
        let n = bytes.len().min(Self::LEN);
        token[..n].copy_from_slice(&bytes[..n]);
        Self(token)
    }

    /// Parse an 8-character hex token.
    pub fn from_hex(input: &str) -> Result<Self, CommandError> {
        let mut token = [0u8; Self::LEN];
        hex::decode_to_slice(input.trim(), &mut token)
            .map_err(|_| CommandError::InvalidToken(input.to_string()))?;
        Ok(Self(token))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Token {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.to_hex())
    }
}

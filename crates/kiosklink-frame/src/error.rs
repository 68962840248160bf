/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes than the smallest frame the protocol allows.
    #[error("frame too short ({len} bytes, min 7)")]
    TooShort { len: usize },

    /// The checksum byte does not match the XOR of the covered bytes.
    #[error("checksum mismatch (expected 0x{expected:02x}, got 0x{actual:02x})")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// The payload does not fit in the 16-bit length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

/// Errors returned while turning a named command into a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// No catalog entry with this name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The token is not 8 hex characters.
    #[error("invalid token: {0:?} (expected 8 hex characters)")]
    InvalidToken(String),

    /// The command parameter failed validation.
    #[error("invalid parameter for {command}: {reason}")]
    InvalidParameter {
        command: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::warn;

use crate::error::{FrameError, Result};
use crate::token::Token;

/// Frame header: length (2) + opcode (1) + version (1) + checksum (1) + token (4) = 9 bytes.
pub const HEADER_SIZE: usize = 9;

/// Anything shorter than this is rejected outright.
pub const MIN_FRAME_LEN: usize = 7;

/// Protocol generation spoken by the current station fleet.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// The length field counts 7 bytes of header on top of the payload.
const LENGTH_BASE: usize = 7;

/// Largest payload whose length still fits the 16-bit length field.
pub const MAX_PAYLOAD: usize = u16::MAX as usize - LENGTH_BASE;

/// Which bytes the checksum covers.
///
/// Station firmware generations disagree on this, so it is a deployment setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChecksumScope {
    /// XOR of the payload bytes only.
    #[default]
    Payload,
    /// XOR of the token bytes followed by the payload bytes.
    TokenAndPayload,
}

impl ChecksumScope {
    /// Compute the checksum byte for a token and payload under this scope.
    pub fn compute(self, token: &Token, payload: &[u8]) -> u8 {
        match self {
            ChecksumScope::Payload => checksum(payload),
            ChecksumScope::TokenAndPayload => checksum(token.as_bytes()) ^ checksum(payload),
        }
    }
}

/// XOR of all bytes; `0x00` for an empty slice.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, b| acc ^ b)
}

/// A decoded (or freshly encoded) protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Length field as carried on the wire.
    pub length: u16,
    pub opcode: u8,
    pub version: u8,
    pub checksum: u8,
    pub token: Token,
    pub payload: Bytes,
    raw: Bytes,
}

impl Frame {
    /// The exact bytes this frame was decoded from or encoded to.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Consume the frame and return its wire bytes.
    pub fn into_bytes(self) -> Bytes {
        self.raw
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        self.raw.len()
    }

    /// Length the header should carry for this payload.
    pub fn expected_length(&self) -> usize {
        LENGTH_BASE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format (big-endian):
/// ```text
/// ┌────────────┬────────┬─────────┬──────────┬───────────┬──────────────┐
/// │ Length (2) │ Op (1) │ Ver (1) │ XOR (1)  │ Token (4) │ Payload (N)  │
/// │ 7 + N      │        │ 0x01    │          │           │              │
/// └────────────┴────────┴─────────┴──────────┴───────────┴──────────────┘
/// ```
pub fn encode_frame(
    opcode: u8,
    version: u8,
    token: &Token,
    payload: &[u8],
    scope: ChecksumScope,
    dst: &mut BytesMut,
) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u16((LENGTH_BASE + payload.len()) as u16);
    dst.put_u8(opcode);
    dst.put_u8(version);
    dst.put_u8(scope.compute(token, payload));
    dst.put_slice(token.as_bytes());
    dst.put_slice(payload);
    Ok(())
}

/// Decode one frame from the bytes of a single socket read.
///
/// The input is assumed to hold exactly one frame. A length field that
/// disagrees with the received byte count is logged and otherwise ignored;
/// the received bytes win. Frames of 7 or 8 bytes carry a zero-padded token.
pub fn decode_frame(src: &[u8], scope: ChecksumScope) -> Result<Frame> {
    if src.len() < MIN_FRAME_LEN {
        return Err(FrameError::TooShort { len: src.len() });
    }

    let length = u16::from_be_bytes([src[0], src[1]]);
    let opcode = src[2];
    let version = src[3];
    let carried = src[4];
    let token = Token::from_prefix(&src[5..src.len().min(HEADER_SIZE)]);
    let payload = src.get(HEADER_SIZE..).unwrap_or_default();

    let expected = scope.compute(&token, payload);
    if carried != expected {
        return Err(FrameError::ChecksumMismatch {
            expected,
            actual: carried,
        });
    }

    if usize::from(length) != LENGTH_BASE + payload.len() {
        warn!(
            declared = length,
            received = src.len(),
            opcode,
            "frame length field disagrees with received bytes"
        );
    }

    let raw = Bytes::copy_from_slice(src);
    Ok(Frame {
        length,
        opcode,
        version,
        checksum: carried,
        token,
        payload: raw.slice(src.len() - payload.len()..),
        raw,
    })
}

/// Configuration for the frame codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecConfig {
    /// Which bytes the checksum covers.
    pub checksum_scope: ChecksumScope,
}

impl CodecConfig {
    /// Encode a current-version frame and return it decoded.
    pub fn encode(&self, opcode: u8, token: &Token, payload: &[u8]) -> Result<Frame> {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        encode_frame(
            opcode,
            PROTOCOL_VERSION,
            token,
            payload,
            self.checksum_scope,
            &mut buf,
        )?;
        let raw = buf.freeze();
        Ok(Frame {
            length: (LENGTH_BASE + payload.len()) as u16,
            opcode,
            version: PROTOCOL_VERSION,
            checksum: raw[4],
            token: *token,
            payload: raw.slice(HEADER_SIZE..),
            raw,
        })
    }

    pub fn decode(&self, src: &[u8]) -> Result<Frame> {
        decode_frame(src, self.checksum_scope)
    }
}

//! Binary framing for the power-bank station protocol.
//!
//! Every message exchanged with a station is framed as:
//! - A 2-byte big-endian length: 7 plus the payload length
//! - A 1-byte opcode and a 1-byte protocol version
//! - A 1-byte XOR checksum
//! - A 4-byte session token
//! - The opcode-specific payload
//!
//! This crate performs no I/O. The station crate feeds it the bytes of one
//! socket read at a time and writes whatever comes back out.

pub mod builder;
pub mod catalog;
pub mod codec;
pub mod error;
pub mod opcode;
pub mod token;

pub use builder::{build_command, CommandBuilder};
pub use catalog::{lookup, lookup_opcode, CommandSpec, ParamKind, CATALOG};
pub use codec::{
    checksum, decode_frame, encode_frame, ChecksumScope, CodecConfig, Frame, HEADER_SIZE,
    MIN_FRAME_LEN, PROTOCOL_VERSION,
};
pub use error::{CommandError, FrameError, Result};
pub use opcode::opcode_name;
pub use token::Token;

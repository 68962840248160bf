use crate::catalog::lookup;
use crate::codec::{CodecConfig, Frame};
use crate::error::CommandError;
use crate::token::Token;

/// Turns a command name, hex token and parameter into a wire frame.
///
/// Pure: resolving the station and writing the frame are the caller's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandBuilder {
    codec: CodecConfig,
}

impl CommandBuilder {
    pub fn new(codec: CodecConfig) -> Self {
        Self { codec }
    }

    /// Build the frame for `command`.
    ///
    /// Validation order: token, then command name, then parameter.
    pub fn build(
        &self,
        command: &str,
        token_hex: &str,
        param: &str,
    ) -> Result<Frame, CommandError> {
        let token = Token::from_hex(token_hex)?;
        let spec = lookup(command)?;
        let payload = spec.build_payload(param)?;
        self.codec
            .encode(spec.opcode, &token, &payload)
            .map_err(|err| CommandError::InvalidParameter {
                command: spec.name,
                reason: err.to_string(),
            })
    }
}

/// Build a command frame with the default codec configuration.
pub fn build_command(command: &str, token_hex: &str, param: &str) -> Result<Frame, CommandError> {
    CommandBuilder::default().build(command, token_hex, param)
}

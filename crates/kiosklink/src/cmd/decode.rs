use kiosklink_frame::CodecConfig;
use kiosklink_station::{Dispatcher, ReplyProfile};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.frame)?;
    let dispatcher = Dispatcher::new(
        CodecConfig {
            checksum_scope: args.checksum_scope.into(),
        },
        ReplyProfile::default(),
    );
    let frame = dispatcher
        .codec()
        .decode(&bytes)
        .map_err(|err| frame_error("decode failed", err))?;
    let dispatch = dispatcher.handle(&frame);

    print_frame(&frame, Some(&dispatch), format);
    Ok(SUCCESS)
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let trimmed = input.trim();
    let digits: String = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(&digits)
        .map_err(|err| CliError::new(USAGE, format!("frame is not valid hex: {err}")))
}

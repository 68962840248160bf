use kiosklink_frame::{CodecConfig, CommandBuilder};

use crate::cmd::EncodeArgs;
use crate::exit::{command_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let builder = CommandBuilder::new(CodecConfig {
        checksum_scope: args.checksum_scope.into(),
    });
    let frame = builder
        .build(&args.command, &args.token, &args.param)
        .map_err(|err| command_error("encode failed", err))?;

    print_frame(&frame, None, format);
    Ok(SUCCESS)
}

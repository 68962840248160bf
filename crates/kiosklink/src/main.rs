mod cmd;
mod exit;
mod http;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "kiosklink", version, about = "Power-bank station gateway")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        env = "KIOSKLINK_LOG_FORMAT",
        default_value = "text",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "KIOSKLINK_LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "kiosklink",
            "encode",
            "rent",
            "--token",
            "11223344",
            "--param",
            "5",
        ])
        .expect("encode args should parse");

        assert!(matches!(cli.command, Command::Encode(ref args) if args.param == "5"));
    }

    #[test]
    fn encode_requires_token() {
        let err = Cli::try_parse_from(["kiosklink", "encode", "rent"])
            .expect_err("missing token should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_serve_with_listen_addresses() {
        let cli = Cli::try_parse_from([
            "kiosklink",
            "serve",
            "--tcp-listen",
            "127.0.0.1:9100",
            "--http-listen",
            "127.0.0.1:9180",
        ])
        .expect("serve args should parse");

        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.tcp_listen.port(), 9100);
        assert_eq!(args.http_listen.port(), 9180);
    }

    #[test]
    fn rejects_bad_listen_address() {
        let parsed = Cli::try_parse_from(["kiosklink", "serve", "--tcp-listen", "nowhere"]);
        assert!(parsed.is_err());
    }
}

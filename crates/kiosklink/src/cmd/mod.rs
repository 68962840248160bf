use std::net::SocketAddr;

use clap::{Args, Subcommand, ValueEnum};
use kiosklink_frame::ChecksumScope;
use kiosklink_station::SupersedePolicy;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the station gateway (TCP) and its HTTP control surface.
    Serve(ServeArgs),
    /// Build a command frame and print it.
    Encode(EncodeArgs),
    /// Decode a hex frame and show how the gateway would answer it.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Which frame bytes the checksum covers.
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum ScopeArg {
    #[default]
    Payload,
    TokenAndPayload,
}

impl From<ScopeArg> for ChecksumScope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Payload => ChecksumScope::Payload,
            ScopeArg::TokenAndPayload => ChecksumScope::TokenAndPayload,
        }
    }
}

/// Reconnect handling for a station that logs in on a new connection.
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum SupersedeArg {
    /// Close the previous connection.
    #[default]
    Close,
    /// Only overwrite the registry entry.
    Keep,
}

impl From<SupersedeArg> for SupersedePolicy {
    fn from(value: SupersedeArg) -> Self {
        match value {
            SupersedeArg::Close => SupersedePolicy::Close,
            SupersedeArg::Keep => SupersedePolicy::Keep,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address stations connect to.
    #[arg(long, env = "KIOSKLINK_TCP_LISTEN", default_value = "0.0.0.0:9000")]
    pub tcp_listen: SocketAddr,
    /// Address of the HTTP control surface.
    #[arg(long, env = "KIOSKLINK_HTTP_LISTEN", default_value = "0.0.0.0:8080")]
    pub http_listen: SocketAddr,
    #[arg(long, env = "KIOSKLINK_CHECKSUM_SCOPE", value_enum, default_value = "payload")]
    pub checksum_scope: ScopeArg,
    #[arg(long, env = "KIOSKLINK_SUPERSEDE", value_enum, default_value = "close")]
    pub supersede: SupersedeArg,
    /// Close stations that stay silent this long (e.g. 90s, 500ms). Off when unset.
    #[arg(long, env = "KIOSKLINK_IDLE_TIMEOUT", value_name = "DURATION")]
    pub idle_timeout: Option<String>,
    /// Require this value in the `x-api-token` header on /send and /stations.
    #[arg(long, env = "KIOSKLINK_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,
    /// Firmware version reported in query_fw replies.
    #[arg(long, env = "KIOSKLINK_FIRMWARE_VERSION")]
    pub firmware_version: Option<String>,
    /// ICCID reported in query_iccid replies.
    #[arg(long, env = "KIOSKLINK_ICCID")]
    pub iccid: Option<String>,
    /// Volume reported in voice_get replies (0-15).
    #[arg(
        long,
        env = "KIOSKLINK_VOICE_LEVEL",
        value_parser = clap::value_parser!(u8).range(0..=15)
    )]
    pub voice_level: Option<u8>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Command name (rent, eject, heartbeat, set_server, ...).
    pub command: String,
    /// Session token, 8 hex characters.
    #[arg(long, short = 't')]
    pub token: String,
    /// Command parameter: slot, voice level, or "host,port,interval".
    #[arg(long, short = 'p', default_value = "")]
    pub param: String,
    #[arg(long, value_enum, default_value = "payload")]
    pub checksum_scope: ScopeArg,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes as hex; spaces and a leading 0x are ignored.
    pub frame: String,
    #[arg(long, value_enum, default_value = "payload")]
    pub checksum_scope: ScopeArg,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

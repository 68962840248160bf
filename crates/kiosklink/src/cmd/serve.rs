use std::net::SocketAddr;
use std::time::Duration;

use kiosklink_frame::CodecConfig;
use kiosklink_station::{Gateway, GatewayConfig, ReplyProfile, SessionConfig};
use kiosklink_transport::StationListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cmd::ServeArgs;
use crate::exit::{io_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::http::{self, HttpState};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let config = gateway_config(&args)?;
    let api_token = args.api_token.filter(|token| !token.is_empty());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))?;

    runtime.block_on(serve(args.tcp_listen, args.http_listen, config, api_token))
}

async fn serve(
    tcp_addr: SocketAddr,
    http_addr: SocketAddr,
    config: GatewayConfig,
    api_token: Option<String>,
) -> CliResult<i32> {
    let listener = StationListener::bind(tcp_addr)
        .await
        .map_err(|err| transport_error("station listener bind failed", err))?;
    let http_listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .map_err(|err| io_error(&format!("http bind failed on {http_addr}"), err))?;

    let gateway = Gateway::new(config);
    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    let state = HttpState::new(gateway.clone(), api_token);

    // Either side stopping takes the other one down with it.
    let stations = async {
        gateway.serve(listener, shutdown.clone()).await;
        shutdown.cancel();
    };
    let control = async {
        let result = http::serve(http_listener, state, shutdown.clone()).await;
        shutdown.cancel();
        result
    };

    let ((), control) = tokio::join!(stations, control);
    control.map_err(|err| io_error("http server failed", err))?;

    info!("gateway stopped");
    Ok(SUCCESS)
}

async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            warn!(error = %err, "cannot listen for ctrl-c; running until killed");
            return;
        }
    }
    shutdown.cancel();
}

fn gateway_config(args: &ServeArgs) -> CliResult<GatewayConfig> {
    let idle_timeout = args
        .idle_timeout
        .as_deref()
        .map(parse_duration)
        .transpose()?;

    let mut replies = ReplyProfile::default();
    if let Some(version) = &args.firmware_version {
        replies.firmware_version = version.clone();
    }
    if let Some(iccid) = &args.iccid {
        replies.iccid = iccid.clone();
    }
    if let Some(level) = args.voice_level {
        replies.voice_level = level;
    }

    Ok(GatewayConfig {
        codec: CodecConfig {
            checksum_scope: args.checksum_scope.into(),
        },
        session: SessionConfig {
            idle_timeout,
            supersede: args.supersede.into(),
            ..SessionConfig::default()
        },
        replies,
    })
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else if let Some(num) = input.strip_suffix('m') {
        (num, "m")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use kiosklink_frame::ChecksumScope;
    use kiosklink_station::SupersedePolicy;

    use super::*;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        serve: ServeArgs,
    }

    fn args(extra: &[&str]) -> ServeArgs {
        let mut argv = vec!["kiosklink"];
        argv.extend_from_slice(extra);
        Wrapper::try_parse_from(argv)
            .expect("serve args should parse")
            .serve
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration(" ").is_err());
    }

    #[test]
    fn defaults_match_baseline_behavior() {
        let config = gateway_config(&args(&[])).unwrap();
        assert_eq!(config.codec.checksum_scope, ChecksumScope::Payload);
        assert_eq!(config.session.supersede, SupersedePolicy::Close);
        assert!(config.session.idle_timeout.is_none());
    }

    #[test]
    fn flags_flow_into_gateway_config() {
        let config = gateway_config(&args(&[
            "--checksum-scope",
            "token-and-payload",
            "--supersede",
            "keep",
            "--idle-timeout",
            "90s",
            "--firmware-version",
            "v9",
            "--voice-level",
            "3",
        ]))
        .unwrap();

        assert_eq!(config.codec.checksum_scope, ChecksumScope::TokenAndPayload);
        assert_eq!(config.session.supersede, SupersedePolicy::Keep);
        assert_eq!(config.session.idle_timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.replies.firmware_version, "v9");
        assert_eq!(config.replies.voice_level, 3);
    }

    #[test]
    fn voice_level_is_range_checked() {
        let parsed = Wrapper::try_parse_from(["kiosklink", "--voice-level", "16"]);
        assert!(parsed.is_err());
    }
}

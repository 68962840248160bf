use std::time::Duration;

use kiosklink_frame::Token;
use kiosklink_transport::{Accepted, StationConnection};
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SupersedePolicy;
use crate::dispatch::Dispatch;
use crate::gateway::Gateway;
use crate::login::StationId;

/// Why a session loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The station closed the socket.
    PeerClosed,
    /// A read failed.
    ReadFailed,
    /// Nothing arrived within the idle timeout.
    IdleTimeout,
    /// Writing a reply failed.
    WriteFailed,
    /// The connection was closed locally (superseded or by a failed command write).
    Closed,
    /// The gateway is shutting down.
    Shutdown,
}

/// Serve one station connection until it ends, then deregister it.
///
/// Frames are handled strictly in arrival order. Each read is treated as one
/// complete frame.
pub async fn run_session(
    gateway: Gateway,
    accepted: Accepted,
    shutdown: CancellationToken,
) -> SessionEnd {
    let Accepted {
        mut reader,
        connection,
    } = accepted;
    let config = gateway.session_config().clone();
    let mut buf = vec![0u8; config.read_buffer_size.max(1)];

    info!(connection = %connection.id(), peer = %connection.peer_addr(), "station connected");

    let end = loop {
        // A superseded connection must stop before it reads another frame.
        let read = tokio::select! {
            biased;
            _ = connection.closed() => break SessionEnd::Closed,
            _ = shutdown.cancelled() => break SessionEnd::Shutdown,
            read = read_once(&mut reader, &mut buf, config.idle_timeout) => read,
        };

        let n = match read {
            ReadResult::Data(n) => n,
            ReadResult::Eof => break SessionEnd::PeerClosed,
            ReadResult::Idle => break SessionEnd::IdleTimeout,
            ReadResult::Failed(err) => {
                warn!(connection = %connection.id(), error = %err, "connection error");
                break SessionEnd::ReadFailed;
            }
        };

        debug!(
            station = %station_label(&gateway, &connection),
            bytes = %hex::encode(&buf[..n]),
            "received"
        );

        let Dispatch {
            reply,
            station,
            token,
        } = gateway.dispatcher().handle_incoming(&buf[..n]);

        if connection.is_closed() {
            break SessionEnd::Closed;
        }
        if let (Some(station), Some(token)) = (station, token) {
            register(&gateway, &connection, station, token, config.supersede);
        }

        if let Some(reply) = reply {
            if let Err(err) = connection.write_frame(&reply).await {
                warn!(connection = %connection.id(), error = %err, "write error");
                break SessionEnd::WriteFailed;
            }
            debug!(
                station = %station_label(&gateway, &connection),
                bytes = %hex::encode(&reply),
                "sent reply"
            );
        }
    };

    gateway.registry().deregister(&connection);
    connection.close();
    if let Err(err) = connection.shutdown().await {
        debug!(connection = %connection.id(), error = %err, "socket shutdown failed");
    }
    info!(connection = %connection.id(), reason = ?end, "session ended");
    end
}

fn register(
    gateway: &Gateway,
    connection: &StationConnection,
    station: StationId,
    token: Token,
    policy: SupersedePolicy,
) {
    info!(%station, %token, connection = %connection.id(), "station registered");
    let displaced = gateway
        .registry()
        .register(station, connection.clone(), token);

    if let Some(old) = displaced {
        match policy {
            SupersedePolicy::Close => {
                info!(
                    station = %old.station,
                    connection = %old.connection.id(),
                    "closing superseded connection"
                );
                old.connection.close();
            }
            SupersedePolicy::Keep => {
                warn!(
                    station = %old.station,
                    connection = %old.connection.id(),
                    "station re-registered; previous connection left open"
                );
            }
        }
    }
}

fn station_label(gateway: &Gateway, connection: &StationConnection) -> String {
    gateway
        .registry()
        .station_for(connection.id())
        .map(|station| station.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

enum ReadResult {
    Data(usize),
    Eof,
    Idle,
    Failed(std::io::Error),
}

async fn read_once(
    reader: &mut OwnedReadHalf,
    buf: &mut [u8],
    idle: Option<Duration>,
) -> ReadResult {
    let read = match idle {
        Some(limit) => match tokio::time::timeout(limit, reader.read(buf)).await {
            Ok(read) => read,
            Err(_) => return ReadResult::Idle,
        },
        None => reader.read(buf).await,
    };
    match read {
        Ok(0) => ReadResult::Eof,
        Ok(n) => ReadResult::Data(n),
        Err(err) => ReadResult::Failed(err),
    }
}

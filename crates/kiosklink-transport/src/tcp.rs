use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::connection::{ConnectionId, StationConnection};
use crate::error::{Result, TransportError};

/// An accepted station connection, split into its two directions.
#[derive(Debug)]
pub struct Accepted {
    /// Read half, owned by the session task.
    pub reader: OwnedReadHalf,
    /// Shareable write handle.
    pub connection: StationConnection,
}

/// TCP listener that stations connect to.
pub struct StationListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    next_connection_id: AtomicU64,
}

impl StationListener {
    /// Bind and listen on `addr`. Port 0 picks an ephemeral port.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;

        info!(%local_addr, "listening for stations");

        Ok(Self {
            listener,
            local_addr,
            next_connection_id: AtomicU64::new(1),
        })
    }

    /// Accept the next connection and assign it a fresh [`ConnectionId`].
    pub async fn accept(&self) -> Result<Accepted> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::Accept)?;
        if let Err(err) = stream.set_nodelay(true) {
            debug!(%peer, error = %err, "failed to set TCP_NODELAY");
        }

        let id = ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed));
        let (reader, writer) = stream.into_split();
        debug!(%peer, connection = %id, "accepted connection");

        Ok(Accepted {
            reader,
            connection: StationConnection::new(id, peer, writer),
        })
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

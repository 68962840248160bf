use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::error::{Result, TransportError};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Process-unique identifier for an accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Shared handle to the write side of a station connection.
///
/// Clones refer to the same socket. Writes are serialized so a reply from the
/// session task and a command from the HTTP side never interleave on the wire.
/// Two handles are equal when they refer to the same accepted connection.
#[derive(Clone)]
pub struct StationConnection {
    inner: Arc<Inner>,
}

struct Inner {
    id: ConnectionId,
    peer: SocketAddr,
    writer: Mutex<BoxedWriter>,
    closed: CancellationToken,
}

impl StationConnection {
    /// Wrap any async writer as a connection handle.
    pub fn new<W>(id: ConnectionId, peer: SocketAddr, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                id,
                peer,
                writer: Mutex::new(Box::new(writer)),
                closed: CancellationToken::new(),
            }),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.peer
    }

    /// Write a complete frame and flush it.
    ///
    /// Fails with `ConnectionClosed` once [`close`](Self::close) has been called.
    pub async fn write_frame(&self, frame: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(TransportError::ConnectionClosed);
        }
        let mut writer = self.inner.writer.lock().await;
        writer.write_all(frame).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Ask the owning session task to stop. Idempotent.
    pub fn close(&self) {
        self.inner.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    /// Resolves once [`close`](Self::close) has been called on any clone.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.inner.closed.cancelled()
    }

    /// Shut down the write direction of the socket.
    pub async fn shutdown(&self) -> Result<()> {
        let mut writer = self.inner.writer.lock().await;
        writer.shutdown().await?;
        Ok(())
    }
}

impl PartialEq for StationConnection {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for StationConnection {}

impl fmt::Debug for StationConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StationConnection")
            .field("id", &self.inner.id)
            .field("peer", &self.inner.peer)
            .field("closed", &self.is_closed())
            .finish()
    }
}

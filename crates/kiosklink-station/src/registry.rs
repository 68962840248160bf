use std::collections::HashMap;
use std::time::SystemTime;

use kiosklink_frame::Token;
use kiosklink_transport::{ConnectionId, StationConnection};
use parking_lot::RwLock;
use tracing::info;

use crate::error::{Result, StationError};
use crate::login::StationId;

/// A logged-in station.
#[derive(Debug, Clone)]
pub struct StationSession {
    pub station: StationId,
    pub connection: StationConnection,
    pub token: Token,
    pub registered_at: SystemTime,
}

/// Identity → session map shared by the TCP and HTTP sides.
///
/// Lookups and listings share a read lock; register/deregister take the write
/// lock. Callers get clones out and do their socket I/O after the lock is gone.
#[derive(Debug, Default)]
pub struct StationRegistry {
    sessions: RwLock<HashMap<StationId, StationSession>>,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the session for `station`.
    ///
    /// Returns the displaced session when it was bound to a different
    /// connection, so the caller can decide what to do with that socket.
    pub fn register(
        &self,
        station: StationId,
        connection: StationConnection,
        token: Token,
    ) -> Option<StationSession> {
        let id = connection.id();
        let session = StationSession {
            station: station.clone(),
            connection,
            token,
            registered_at: SystemTime::now(),
        };
        let previous = self.sessions.write().insert(station, session);
        previous.filter(|old| old.connection.id() != id)
    }

    /// Remove every session bound to `connection`; returns the removed identities.
    pub fn deregister(&self, connection: &StationConnection) -> Vec<StationId> {
        self.deregister_id(connection.id())
    }

    /// Remove every session bound to the connection with this id.
    pub fn deregister_id(&self, id: ConnectionId) -> Vec<StationId> {
        let mut sessions = self.sessions.write();
        let stale: Vec<StationId> = sessions
            .iter()
            .filter(|(_, session)| session.connection.id() == id)
            .map(|(station, _)| station.clone())
            .collect();
        for station in &stale {
            sessions.remove(station);
            info!(%station, connection = %id, "station disconnected");
        }
        stale
    }

    /// The live session for `station`.
    pub fn lookup(&self, station: &str) -> Result<StationSession> {
        self.sessions
            .read()
            .get(station)
            .cloned()
            .ok_or_else(|| StationError::StationNotFound(station.to_string()))
    }

    /// Identity registered on `id`, for log context.
    pub fn station_for(&self, id: ConnectionId) -> Option<StationId> {
        self.sessions
            .read()
            .values()
            .find(|session| session.connection.id() == id)
            .map(|session| session.station.clone())
    }

    /// Snapshot of every session, ordered by identity.
    pub fn list(&self) -> Vec<StationSession> {
        let mut sessions: Vec<StationSession> = self.sessions.read().values().cloned().collect();
        sessions.sort_by(|a, b| a.station.cmp(&b.station));
        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

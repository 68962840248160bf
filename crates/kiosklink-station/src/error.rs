use kiosklink_frame::CommandError;
use kiosklink_transport::TransportError;

/// Errors returned when pushing a command to a station.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// The requested command could not be built.
    #[error("command rejected: {0}")]
    Command(#[from] CommandError),

    /// No live session is registered under this identity.
    #[error("no station connected with ID: {0}")]
    StationNotFound(String),

    /// Writing to the station's socket failed; the connection has been dropped.
    #[error("failed to send to station {station}: {source}")]
    ConnectionWriteFailure {
        station: String,
        source: TransportError,
    },
}

pub type Result<T> = std::result::Result<T, StationError>;

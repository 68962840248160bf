//! TCP transport for station connections.
//!
//! Stations hold one long-lived TCP connection each. This crate binds the
//! listener, accepts connections, and hands out a cloneable
//! [`StationConnection`] that any task can write frames through while the
//! session task owns the read half.
//!
//! This is the lowest layer of kiosklink. Nothing here knows about frames.

pub mod connection;
pub mod error;
pub mod tcp;

pub use connection::{ConnectionId, StationConnection};
pub use error::{Result, TransportError};
pub use tcp::{Accepted, StationListener};

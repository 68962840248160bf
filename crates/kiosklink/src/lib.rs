//! Gateway between power-bank rental stations and an HTTP caller.
//!
//! Stations keep a TCP connection open and speak a small binary protocol;
//! the gateway answers them and lets an HTTP client push commands to a
//! station by the identity it reported at login.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP listener and shared connection handles
//! - [`frame`]: frame codec, command catalog and outbound command builder
//! - [`station`]: opcode dispatch, station registry and the session loop

/// Re-export transport types.
pub mod transport {
    pub use kiosklink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use kiosklink_frame::*;
}

/// Re-export station types.
pub mod station {
    pub use kiosklink_station::*;
}

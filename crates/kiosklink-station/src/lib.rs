//! Station-side gateway logic.
//!
//! Accepts station connections, answers their frames by opcode, and keeps
//! a registry of which station is on which socket so commands can be pushed
//! to it by identity.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod login;
pub mod registry;
pub mod server;
pub mod session;

pub use config::{
    power_bank_id_bytes, GatewayConfig, PowerBankSlot, ReplyProfile, SessionConfig,
    SupersedePolicy, DEFAULT_READ_BUFFER, POWER_BANK_ID_LEN,
};
pub use dispatch::{Dispatch, Dispatcher, Handler, Outcome, Reply, SUCCESS};
pub use error::{Result, StationError};
pub use gateway::{Gateway, SentCommand};
pub use login::{LoginRequest, StationId};
pub use registry::{StationRegistry, StationSession};
pub use session::{run_session, SessionEnd};

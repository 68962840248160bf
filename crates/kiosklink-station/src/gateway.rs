use std::sync::Arc;

use kiosklink_frame::{CommandBuilder, Frame};
use tracing::{info, warn};

use crate::config::{GatewayConfig, SessionConfig};
use crate::dispatch::Dispatcher;
use crate::error::{Result, StationError};
use crate::login::StationId;
use crate::registry::StationRegistry;

/// A command that made it onto a station's socket.
#[derive(Debug, Clone)]
pub struct SentCommand {
    pub station: StationId,
    pub command: String,
    /// Token the frame was built with, as hex.
    pub token: String,
    pub frame: Frame,
}

/// The gateway service: registry, dispatcher and command builder behind one handle.
///
/// Cheap to clone; every clone shares the same registry.
#[derive(Clone)]
pub struct Gateway {
    registry: Arc<StationRegistry>,
    dispatcher: Arc<Dispatcher>,
    builder: CommandBuilder,
    session: SessionConfig,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            registry: Arc::new(StationRegistry::new()),
            dispatcher: Arc::new(Dispatcher::new(config.codec, config.replies)),
            builder: CommandBuilder::new(config.codec),
            session: config.session,
        }
    }

    pub fn registry(&self) -> &Arc<StationRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session
    }

    /// Build `command` and write it to the station registered as `station`.
    ///
    /// Uses `token` when given, otherwise the token captured at login. A failed
    /// write closes and deregisters the connection.
    pub async fn send_command(
        &self,
        station: &str,
        command: &str,
        token: Option<&str>,
        param: &str,
    ) -> Result<SentCommand> {
        let session = self.registry.lookup(station)?;
        let token = match token.filter(|t| !t.is_empty()) {
            Some(explicit) => explicit.to_string(),
            None => session.token.to_hex(),
        };

        let frame = self.builder.build(command, &token, param)?;

        if let Err(source) = session.connection.write_frame(frame.raw()).await {
            warn!(%station, error = %source, "write to station failed; dropping connection");
            session.connection.close();
            self.registry.deregister(&session.connection);
            return Err(StationError::ConnectionWriteFailure {
                station: station.to_string(),
                source,
            });
        }

        info!(
            %station,
            command,
            frame = %hex::encode(frame.raw()),
            "sent command"
        );

        Ok(SentCommand {
            station: session.station,
            command: command.to_string(),
            token,
            frame,
        })
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new(GatewayConfig::default())
    }
}

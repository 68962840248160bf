use std::time::Duration;

use kiosklink_transport::StationListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::gateway::Gateway;
use crate::session::run_session;

/// Pause after a failed accept so a persistent error (e.g. fd exhaustion) does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

impl Gateway {
    /// Accept station connections until `shutdown` fires.
    ///
    /// Each connection gets its own task. A failed accept is logged and the
    /// loop keeps going. On shutdown every session is told to stop and awaited.
    pub async fn serve(&self, listener: StationListener, shutdown: CancellationToken) {
        info!(addr = %listener.local_addr(), "station listener ready");

        let mut sessions = JoinSet::new();

        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok(accepted) => {
                    sessions.spawn(run_session(self.clone(), accepted, shutdown.child_token()));
                }
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }

            // Reap finished sessions so the set does not grow without bound.
            while let Some(done) = sessions.try_join_next() {
                if let Err(err) = done {
                    warn!(error = %err, "session task failed");
                }
            }
        }

        debug!(open = sessions.len(), "stopping station sessions");
        while let Some(done) = sessions.join_next().await {
            if let Err(err) = done {
                warn!(error = %err, "session task failed");
            }
        }
        info!("station listener stopped");
    }
}

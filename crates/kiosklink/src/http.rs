//! HTTP control surface.
//!
//! Provides:
//! - `/ping` - liveness, always open
//! - `/stations` - connected stations
//! - `/send` - build a command and push it to a station
//!
//! When an API token is configured, `/stations` and `/send` require it in the
//! `x-api-token` header.

use std::sync::Arc;
use std::time::UNIX_EPOCH;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use constant_time_eq::constant_time_eq;
use kiosklink_station::{Gateway, StationError, StationSession};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const API_TOKEN_HEADER: &str = "x-api-token";

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    gateway: Gateway,
    api_token: Option<Arc<str>>,
}

impl HttpState {
    pub fn new(gateway: Gateway, api_token: Option<String>) -> Self {
        Self {
            gateway,
            api_token: api_token.map(Arc::from),
        }
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        let Some(expected) = &self.api_token else {
            return Ok(());
        };
        let presented = headers
            .get(API_TOKEN_HEADER)
            .map(|value| value.as_bytes())
            .unwrap_or_default();
        if constant_time_eq(presented, expected.as_bytes()) {
            Ok(())
        } else {
            warn!("rejected request without valid api token");
            Err((StatusCode::UNAUTHORIZED, "Unauthorized").into_response())
        }
    }
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/stations", get(stations_handler))
        .route("/send", get(send_handler))
        .with_state(state)
}

/// Serve the control surface until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: HttpState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "http control surface ready");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn ping_handler() -> &'static str {
    "pong"
}

/// One row of the `/stations` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationEntry {
    #[serde(rename = "stationID")]
    pub station_id: String,
    pub token: String,
    pub status: String,
    pub peer: String,
    /// Unix seconds.
    pub registered_at: u64,
}

impl From<&StationSession> for StationEntry {
    fn from(session: &StationSession) -> Self {
        Self {
            station_id: session.station.to_string(),
            token: session.token.to_hex(),
            status: "connected".to_string(),
            peer: session.connection.peer_addr().to_string(),
            registered_at: session
                .registered_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationsResponse {
    pub count: usize,
    pub stations: Vec<StationEntry>,
}

async fn stations_handler(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    if let Err(rejected) = state.authorize(&headers) {
        return rejected;
    }
    let stations: Vec<StationEntry> = state
        .gateway
        .registry()
        .list()
        .iter()
        .map(StationEntry::from)
        .collect();
    Json(StationsResponse {
        count: stations.len(),
        stations,
    })
    .into_response()
}

/// Missing query parameters arrive as empty strings.
#[derive(Debug, Default, Deserialize)]
pub struct SendQuery {
    #[serde(rename = "stationID", default)]
    pub station_id: String,
    #[serde(default)]
    pub cmd: String,
    #[serde(default)]
    pub slot: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub status: String,
    #[serde(rename = "stationID")]
    pub station_id: String,
    pub command: String,
    pub token: String,
    /// The frame as written, hex.
    pub payload: String,
    pub slot: String,
}

async fn send_handler(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(query): Query<SendQuery>,
) -> Response {
    if let Err(rejected) = state.authorize(&headers) {
        return rejected;
    }

    let result = state
        .gateway
        .send_command(
            &query.station_id,
            &query.cmd,
            query.token.as_deref(),
            &query.slot,
        )
        .await;

    match result {
        Ok(sent) => Json(SendResponse {
            status: "success".to_string(),
            station_id: sent.station.to_string(),
            command: sent.command,
            token: sent.token,
            payload: hex::encode(sent.frame.raw()),
            slot: query.slot,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: StationError) -> Response {
    let (status, message) = match &err {
        StationError::StationNotFound(id) => (
            StatusCode::BAD_REQUEST,
            format!("No station connected with ID: {id}"),
        ),
        StationError::Command(cause) => (
            StatusCode::BAD_REQUEST,
            format!("Invalid command or parameters: {cause}"),
        ),
        StationError::ConnectionWriteFailure { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to send command: {err}"),
        ),
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    };
    warn!(status = status.as_u16(), error = %err, "send rejected");
    (status, message).into_response()
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::http::HeaderValue;
    use kiosklink_frame::Token;
    use kiosklink_station::StationId;
    use kiosklink_transport::{ConnectionId, StationConnection};
    use tokio::io::AsyncReadExt;

    use super::*;

    fn peer() -> SocketAddr {
        "10.0.0.7:40000".parse().expect("valid socket address")
    }

    fn register(gateway: &Gateway, id: &str, connection: StationConnection) {
        gateway.registry().register(
            StationId::new(id).expect("non-empty id"),
            connection,
            Token([0x11, 0x22, 0x33, 0x44]),
        );
    }

    fn query(station: &str, cmd: &str, slot: &str) -> Query<SendQuery> {
        Query(SendQuery {
            station_id: station.to_string(),
            cmd: cmd.to_string(),
            slot: slot.to_string(),
            token: None,
        })
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    #[tokio::test]
    async fn ping_answers_pong() {
        assert_eq!(ping_handler().await, "pong");
    }

    #[tokio::test]
    async fn send_delivers_frame_and_reports_it() {
        let gateway = Gateway::default();
        let (local, mut remote) = tokio::io::duplex(64);
        let connection = StationConnection::new(ConnectionId(1), peer(), local);
        register(&gateway, "STATION001", connection);
        let state = HttpState::new(gateway, None);

        let response = send_handler(
            State(state),
            HeaderMap::new(),
            query("STATION001", "rent", "5"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: SendResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body.status, "success");
        assert_eq!(body.station_id, "STATION001");
        assert_eq!(body.command, "rent");
        assert_eq!(body.token, "11223344");
        assert_eq!(body.payload, "00086501051122334405");
        assert_eq!(body.slot, "5");

        let mut wire = [0u8; 10];
        remote.read_exact(&mut wire).await.unwrap();
        assert_eq!(hex::encode(wire), body.payload);
    }

    #[tokio::test]
    async fn unknown_station_is_bad_request() {
        let state = HttpState::new(Gateway::default(), None);
        let query = query("ghost", "rent", "1");
        let response = send_handler(State(state), HeaderMap::new(), query).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(response).await,
            "No station connected with ID: ghost"
        );
    }

    #[tokio::test]
    async fn invalid_parameter_is_bad_request() {
        let gateway = Gateway::default();
        register(
            &gateway,
            "S1",
            StationConnection::new(ConnectionId(1), peer(), tokio::io::sink()),
        );
        let state = HttpState::new(gateway, None);

        let query = query("S1", "voice_set", "16");
        let response = send_handler(State(state), HeaderMap::new(), query).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await;
        assert!(body.starts_with("Invalid command or parameters"));
    }

    #[tokio::test]
    async fn write_failure_is_server_error_and_drops_station() {
        let gateway = Gateway::default();
        let (local, remote) = tokio::io::duplex(64);
        drop(remote);
        let connection = StationConnection::new(ConnectionId(1), peer(), local);
        register(&gateway, "S1", connection);
        let state = HttpState::new(gateway.clone(), None);

        let query = query("S1", "restart", "");
        let response = send_handler(State(state), HeaderMap::new(), query).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(gateway.registry().is_empty());
    }

    #[tokio::test]
    async fn stations_lists_registered_sessions() {
        let gateway = Gateway::default();
        register(
            &gateway,
            "B",
            StationConnection::new(ConnectionId(2), peer(), tokio::io::sink()),
        );
        register(
            &gateway,
            "A",
            StationConnection::new(ConnectionId(1), peer(), tokio::io::sink()),
        );
        let state = HttpState::new(gateway, None);

        let response = stations_handler(State(state), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: StationsResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body.count, 2);
        assert_eq!(body.stations[0].station_id, "A");
        assert_eq!(body.stations[0].status, "connected");
        assert_eq!(body.stations[0].token, "11223344");
        assert_eq!(body.stations[0].peer, "10.0.0.7:40000");
    }

    #[tokio::test]
    async fn api_token_guards_stations_and_send() {
        let state = HttpState::new(Gateway::default(), Some("s3cret".to_string()));

        let denied = stations_handler(State(state.clone()), HeaderMap::new()).await;
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let mut wrong = HeaderMap::new();
        wrong.insert(API_TOKEN_HEADER, HeaderValue::from_static("nope"));
        let denied = send_handler(State(state.clone()), wrong, query("S1", "rent", "1")).await;
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let mut good = HeaderMap::new();
        good.insert(API_TOKEN_HEADER, HeaderValue::from_static("s3cret"));
        let allowed = stations_handler(State(state), good).await;
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_token_must_match_every_byte() {
        let state = HttpState::new(Gateway::default(), Some("s3cret".to_string()));

        for presented in ["s3creT", "s3cre", "s3crets", ""] {
            let mut headers = HeaderMap::new();
            headers.insert(
                API_TOKEN_HEADER,
                HeaderValue::from_str(presented).expect("valid header value"),
            );
            let denied = stations_handler(State(state.clone()), headers).await;
            assert_eq!(denied.status(), StatusCode::UNAUTHORIZED, "{presented:?}");
        }
    }

    #[tokio::test]
    async fn router_serves_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let server = tokio::spawn(serve(
            listener,
            HttpState::new(Gateway::default(), None),
            shutdown.clone(),
        ));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        tokio::io::AsyncWriteExt::write_all(
            &mut stream,
            b"GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("pong"));

        shutdown.cancel();
        server.await.unwrap().unwrap();
    }
}

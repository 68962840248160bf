#![cfg(feature = "cli")]

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

struct Gateway {
    child: Child,
    tcp: SocketAddr,
    http: SocketAddr,
}

impl Gateway {
    fn start(extra: &[&str]) -> Self {
        let tcp = free_addr();
        let http = free_addr();
        let child = Command::new(env!("CARGO_BIN_EXE_kiosklink"))
            .args(["--log-level", "error", "serve"])
            .arg("--tcp-listen")
            .arg(tcp.to_string())
            .arg("--http-listen")
            .arg(http.to_string())
            .args(extra)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("serve should start");

        let gateway = Self { child, tcp, http };
        wait_for_connect(gateway.http, Duration::from_secs(5)).expect("http side should come up");
        wait_for_connect(gateway.tcp, Duration::from_secs(5)).expect("tcp side should come up");
        gateway
    }

    fn station(&self) -> TcpStream {
        let stream = TcpStream::connect(self.tcp).expect("station should connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout should be settable");
        stream
    }

    fn get(&self, path_and_query: &str, headers: &[(&str, &str)]) -> (u16, String) {
        let mut stream = TcpStream::connect(self.http).expect("http should connect");
        let mut request =
            format!("GET {path_and_query} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
        for (name, value) in headers {
            request.push_str(&format!("{name}: {value}\r\n"));
        }
        request.push_str("\r\n");
        stream
            .write_all(request.as_bytes())
            .expect("request should send");

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .expect("response should read");
        let status = response
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .expect("status line should carry a code");
        let body = response
            .split_once("\r\n\r\n")
            .map(|(_, body)| body.to_string())
            .unwrap_or_default();
        (status, body)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_addr() -> SocketAddr {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("ephemeral port should be available")
}

fn wait_for_connect(addr: SocketAddr, timeout: Duration) -> io::Result<()> {
    let start = Instant::now();
    loop {
        match TcpStream::connect(addr) {
            Ok(_) => return Ok(()),
            Err(err) => {
                if start.elapsed() >= timeout {
                    return Err(io::Error::other(format!("connect timeout: {err}")));
                }
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

/// Login for box id "STATION001" with token 11223344.
fn login_frame() -> Vec<u8> {
    let mut payload = vec![0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00, 0x00, 0x0B];
    payload.extend_from_slice(b"STATION001\0");
    let checksum = payload.iter().fold(0u8, |acc, b| acc ^ b);

    let mut frame = Vec::new();
    frame.extend_from_slice(&((7 + payload.len()) as u16).to_be_bytes());
    frame.extend_from_slice(&[0x60, 0x01, checksum, 0x11, 0x22, 0x33, 0x44]);
    frame.extend_from_slice(&payload);
    frame
}

fn login(station: &mut TcpStream) {
    station
        .write_all(&login_frame())
        .expect("login should send");
    let mut reply = [0u8; 10];
    station
        .read_exact(&mut reply)
        .expect("login reply should arrive");
    assert_eq!(
        reply,
        [0x00, 0x08, 0x60, 0x01, 0x01, 0x11, 0x22, 0x33, 0x44, 0x01]
    );
}

#[test]
fn ping_answers_pong() {
    let gateway = Gateway::start(&[]);
    assert_eq!(gateway.get("/ping", &[]), (200, "pong".to_string()));
}

#[test]
fn send_reaches_logged_in_station() {
    let gateway = Gateway::start(&[]);
    let mut station = gateway.station();
    login(&mut station);

    let (status, body) = gateway.get("/send?stationID=STATION001&cmd=rent&slot=5", &[]);
    assert_eq!(status, 200, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).expect("send should return json");
    assert_eq!(json["status"], "success");
    assert_eq!(json["token"], "11223344");
    assert_eq!(json["payload"], "00086501051122334405");

    let mut frame = [0u8; 10];
    station
        .read_exact(&mut frame)
        .expect("command should reach the station");
    assert_eq!(
        frame,
        [0x00, 0x08, 0x65, 0x01, 0x05, 0x11, 0x22, 0x33, 0x44, 0x05]
    );

    let (status, body) = gateway.get("/stations", &[]);
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("stations should return json");
    assert_eq!(json["count"], 1);
    assert_eq!(json["stations"][0]["stationID"], "STATION001");
}

#[test]
fn send_to_unknown_station_is_400() {
    let gateway = Gateway::start(&[]);
    let (status, body) = gateway.get("/send?stationID=ghost&cmd=rent&slot=1", &[]);

    assert_eq!(status, 400);
    assert_eq!(body, "No station connected with ID: ghost");
}

#[test]
fn api_token_is_enforced() {
    let gateway = Gateway::start(&["--api-token", "s3cret"]);

    assert_eq!(gateway.get("/stations", &[]).0, 401);
    let authorized = gateway.get("/stations", &[("x-api-token", "s3cret")]);
    assert_eq!(authorized.0, 200);
    assert_eq!(gateway.get("/ping", &[]).0, 200);
}

#[test]
fn port_in_use_exits_with_transport_error() {
    let taken = TcpListener::bind("127.0.0.1:0").expect("bind should work");
    let addr = taken.local_addr().expect("local addr");

    let output = Command::new(env!("CARGO_BIN_EXE_kiosklink"))
        .args(["--log-level", "error", "serve", "--tcp-listen"])
        .arg(addr.to_string())
        .arg("--http-listen")
        .arg(free_addr().to_string())
        .output()
        .expect("serve should run");

    assert_eq!(output.status.code(), Some(3));
}

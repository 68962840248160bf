#![cfg(feature = "cli")]

use std::process::{Command, Output};

fn kiosklink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kiosklink"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("kiosklink should run")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).expect("stdout should be json")
}

#[test]
fn encode_rent_prints_frame() {
    let output = kiosklink(&[
        "--format", "json", "encode", "rent", "--token", "11223344", "--param", "5",
    ]);

    assert!(output.status.success());
    let frame = stdout_json(&output);
    assert_eq!(frame["frame"], "00086501051122334405");
    assert_eq!(frame["checksum"], "0x05");
    assert_eq!(frame["command"], "rent");
}

#[test]
fn encode_raw_format_is_bare_hex() {
    let output = kiosklink(&[
        "--format",
        "raw",
        "encode",
        "heartbeat",
        "--token",
        "00000000",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "000761010000000000");
}

#[test]
fn encode_set_server_with_token_scope() {
    let output = kiosklink(&[
        "--format",
        "json",
        "encode",
        "set_server",
        "--token",
        "01020304",
        "--param",
        "a.b,80,30",
        "--checksum-scope",
        "token-and-payload",
    ]);

    assert!(output.status.success());
    let frame = stdout_json(&output);
    assert_eq!(frame["opcode"], "0x63");
    assert_eq!(frame["payload"], "0004612e620000033830001e");
}

#[test]
fn encode_out_of_range_slot_is_data_invalid() {
    let output = kiosklink(&["encode", "eject", "--token", "11223344", "--param", "0"]);

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid parameter"));
}

#[test]
fn encode_unknown_command_is_usage_error() {
    let output = kiosklink(&["encode", "launch", "--token", "11223344"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn decode_login_shows_station_and_reply() {
    // login: random(4) magic(2) len=0x0003 "AB\0"
    let payload = "0102030400000003414200";
    let frame = format!("0012600104aabbccdd{payload}");
    let output = kiosklink(&["--format", "json", "decode", &frame]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
    let decoded = stdout_json(&output);
    assert_eq!(decoded["command"], "login");
    assert_eq!(decoded["token"], "aabbccdd");
    assert_eq!(decoded["station_id"], "AB");
    assert_eq!(decoded["reply"], "0008600101aabbccdd01");
}

#[test]
fn decode_heartbeat_echoes_seven_bytes() {
    let heartbeat = "00 07 61 01 00 11 22 33 44";
    let output = kiosklink(&["--format", "json", "decode", heartbeat]);

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["reply"], "00076101001122");
}

#[test]
fn decode_bad_checksum_is_data_invalid() {
    let output = kiosklink(&["decode", "00086501ff1122334405"]);

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("checksum mismatch"));
}

#[test]
fn decode_rejects_non_hex() {
    let output = kiosklink(&["decode", "not-hex"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_reports_package_version() {
    let output = kiosklink(&["version"]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("kiosklink {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn version_extended_lists_commands() {
    let output = kiosklink(&["version", "--extended"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("protocol_version: 1"));
    assert!(stdout.contains("rent"));
    assert!(stdout.contains("set_server"));
}

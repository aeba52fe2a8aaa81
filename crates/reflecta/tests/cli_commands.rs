#![cfg(all(unix, feature = "cli"))]

use std::process::{Command, Output};

fn reflecta(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_reflecta"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .env_remove("REFLECTA_DEVICE")
        .env_remove("REFLECTA_BAUD")
        .output()
        .expect("reflecta should run")
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect()
}

#[test]
fn encode_escapes_reserved_bytes() {
    let output = reflecta(&["encode", "--sequence", "5", "--hex", "01 c0 02"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["event"], "encoded");
    assert_eq!(lines[0]["sequence"], 5);
    assert_eq!(lines[0]["checksum"], "c6");
    assert_eq!(lines[0]["wire_hex"], "05 01 db dc 02 c6 c0");
}

#[test]
fn encode_raw_writes_wire_bytes() {
    let output = Command::new(env!("CARGO_BIN_EXE_reflecta"))
        .args(["--log-level", "error", "--format", "raw", "encode", "--data", "hi"])
        .output()
        .expect("reflecta should run");

    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0x00, b'h', b'i', b'h' ^ b'i', 0xC0]);
}

#[test]
fn encode_rejects_oversized_payload() {
    let data = "x".repeat(254);
    let output = reflecta(&["encode", "--data", &data]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn decode_prints_frames() {
    let output = reflecta(&["decode", "--hex", "00 61 62 03 c0 01 7e 02 7d c0"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event"], "frame");
    assert_eq!(lines[0]["sequence"], 0);
    assert_eq!(lines[0]["payload"], "ab");
    assert_eq!(lines[1]["sequence"], 1);
    assert_eq!(lines[1]["diagnostic"], "warning CRC_MISMATCH (0x02)");
}

#[test]
fn decode_reports_violations_and_fails() {
    let output = reflecta(&["decode", "--hex", "00 61 62 04 c0 01 01 c0"]);
    assert_eq!(output.status.code(), Some(60));

    let lines = json_lines(&output);
    assert_eq!(lines[0]["event"], "violation");
    assert_eq!(lines[0]["kind"], "checksum_mismatch");
    assert_eq!(lines[1]["event"], "frame");
    assert_eq!(lines[1]["sequence"], 1);
}

#[test]
fn decode_requires_input() {
    let output = reflecta(&["decode"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn send_to_missing_device_fails() {
    let output = reflecta(&["send", "/dev/reflecta-does-not-exist", "--data", "x"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("open failed"));
}

#[test]
fn version_prints_name() {
    let output = reflecta(&["version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("reflecta "));
}

use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use reflecta_frame::{Diagnostic, Frame, ProtocolViolation};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    event: &'a str,
    sequence: u8,
    payload_size: usize,
    payload: String,
    payload_hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostic: Option<String>,
    timestamp: String,
}

#[derive(Serialize)]
struct WireOutput<'a> {
    event: &'a str,
    sequence: u8,
    checksum: String,
    wire_size: usize,
    wire_hex: String,
}

#[derive(Serialize)]
struct ViolationOutput<'a> {
    event: &'a str,
    kind: &'a str,
    message: String,
    timestamp: String,
}

/// Print a received frame. Diagnostic frames from the peer are shown parsed.
pub fn print_frame(frame: &Frame, format: OutputFormat) {
    let diagnostic = Diagnostic::parse(frame.payload.as_ref());
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                event: "frame",
                sequence: frame.sequence,
                payload_size: frame.payload.len(),
                payload: payload_preview(frame.payload.as_ref()),
                payload_hex: to_hex(frame.payload.as_ref()),
                diagnostic: diagnostic.as_ref().map(ToString::to_string),
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEQ", "SIZE", "PAYLOAD", "DIAGNOSTIC"])
                .add_row(vec![
                    format!("{:#04x}", frame.sequence),
                    frame.payload.len().to_string(),
                    payload_preview(frame.payload.as_ref()),
                    diagnostic.map(|d| d.to_string()).unwrap_or_default(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match diagnostic {
            Some(diagnostic) => println!("seq={:#04x} peer {diagnostic}", frame.sequence),
            None => println!(
                "seq={:#04x} size={} payload={}",
                frame.sequence,
                frame.payload.len(),
                payload_preview(frame.payload.as_ref())
            ),
        },
        OutputFormat::Raw => print_raw(frame.payload.as_ref()),
    }
}

/// Print an encoded frame.
pub fn print_wire(sequence: u8, checksum: u8, wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&WireOutput {
            event: "encoded",
            sequence,
            checksum: format!("{checksum:02x}"),
            wire_size: wire.len(),
            wire_hex: to_hex(wire),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEQ", "CHECKSUM", "SIZE", "WIRE"])
                .add_row(vec![
                    format!("{sequence:#04x}"),
                    format!("{checksum:#04x}"),
                    wire.len().to_string(),
                    to_hex(wire),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", to_hex(wire)),
        OutputFormat::Raw => print_raw(wire),
    }
}

/// Print a violation detected while decoding. Raw output has no room for
/// these, so they go to stderr there.
pub fn print_violation(violation: &ProtocolViolation, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ViolationOutput {
            event: "violation",
            kind: violation.kind(),
            message: violation.to_string(),
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("violation {}: {violation}", violation.kind())
        }
        OutputFormat::Raw => eprintln!("violation {}: {violation}", violation.kind()),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Lowercase hex, bytes separated by spaces.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) if !text.chars().any(char::is_control) => text.to_string(),
        _ => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use kiosklink_frame::{opcode_name, Frame};
use kiosklink_station::Dispatch;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    /// Bare hex of the frame bytes.
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
    length: u16,
    opcode: String,
    command: &'a str,
    version: u8,
    checksum: String,
    token: String,
    payload: String,
    frame: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    station_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<String>,
}

impl<'a> FrameOutput<'a> {
    fn new(frame: &Frame, dispatch: Option<&'a Dispatch>) -> Self {
        Self {
            length: frame.length,
            opcode: format!("0x{:02x}", frame.opcode),
            command: opcode_name(frame.opcode),
            version: frame.version,
            checksum: format!("0x{:02x}", frame.checksum),
            token: frame.token.to_hex(),
            payload: hex::encode(&frame.payload),
            frame: hex::encode(frame.raw()),
            station_id: dispatch
                .and_then(|d| d.station.as_ref())
                .map(|station| station.as_str()),
            reply: dispatch.and_then(|d| d.reply.as_ref()).map(hex::encode),
        }
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("length", self.length.to_string()),
            ("opcode", format!("{} ({})", self.opcode, self.command)),
            ("version", self.version.to_string()),
            ("checksum", self.checksum.clone()),
            ("token", self.token.clone()),
            ("payload", self.payload.clone()),
        ];
        if let Some(station) = self.station_id {
            rows.push(("station_id", station.to_string()));
        }
        if let Some(reply) = &self.reply {
            rows.push(("reply", reply.clone()));
        }
        rows
    }
}

/// Print a frame; `dispatch` adds the identity and reply the gateway would produce.
pub fn print_frame(frame: &Frame, dispatch: Option<&Dispatch>, format: OutputFormat) {
    let out = FrameOutput::new(frame, dispatch);
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in out.rows() {
                table.add_row(vec![field.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line = out
                .rows()
                .into_iter()
                .map(|(field, value)| format!("{field}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
        }
        OutputFormat::Raw => {
            println!("{}", out.frame);
        }
    }
}

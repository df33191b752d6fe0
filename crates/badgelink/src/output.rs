use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use badgelink_frame::{to_hex, Command, Message, FRAME_SIZE, PAYLOAD_SIZE, SYNC};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
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
struct MessageOutput {
    payload: String,
    value: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<u8>,
    timestamp: String,
}

impl MessageOutput {
    fn new(message: &Message) -> Self {
        let command = message.as_command();
        Self {
            payload: to_hex(message.as_bytes()),
            value: message.value(),
            mode: command.map(|c| c.mode),
            data: command.map(|c| c.data),
            timestamp: now_unix_seconds(),
        }
    }
}

#[derive(Serialize)]
struct FrameOutput {
    mode: u8,
    data: u8,
    frame: String,
    payload: String,
    complement: String,
}

pub fn print_message(message: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", to_json(&MessageOutput::new(message)));
        }
        OutputFormat::Table => {
            let out = MessageOutput::new(message);
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PAYLOAD", "VALUE", "MODE", "DATA"])
                .add_row(vec![
                    out.payload,
                    format!("0x{:08X}", out.value),
                    byte_cell(out.mode),
                    byte_cell(out.data),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match message.as_command() {
            Some(command) => println!(
                "payload={} mode=0x{:02X} data=0x{:02X}",
                to_hex(message.as_bytes()),
                command.mode,
                command.data
            ),
            None => println!("payload={}", to_hex(message.as_bytes())),
        },
        OutputFormat::Raw => print_raw(message.as_bytes()),
    }
}

pub fn print_frame(command: &Command, frame: &[u8; FRAME_SIZE], format: OutputFormat) {
    let payload = &frame[SYNC.len()..SYNC.len() + PAYLOAD_SIZE];
    let inverted = &frame[SYNC.len() + PAYLOAD_SIZE..];

    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                mode: command.mode,
                data: command.data,
                frame: to_hex(frame),
                payload: to_hex(payload),
                complement: to_hex(inverted),
            };
            println!("{}", to_json(&out));
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SYNC", "PAYLOAD", "COMPLEMENT"])
                .add_row(vec![to_hex(&SYNC), to_hex(payload), to_hex(inverted)]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", to_hex(frame)),
        OutputFormat::Raw => print_raw(frame),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn byte_cell(value: Option<u8>) -> String {
    value
        .map(|b| format!("0x{b:02X}"))
        .unwrap_or_else(|| "-".to_string())
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use badgelink_frame::FrameDecoder;

    use super::*;

    fn decode_one(bytes: &[u8]) -> Message {
        let mut decoder = FrameDecoder::new();
        bytes
            .iter()
            .find_map(|&b| decoder.feed(b))
            .expect("frame should decode")
    }

    #[test]
    fn command_message_json_carries_mode_and_data() {
        let message = decode_one(&badgelink_frame::encode(0x01, 0x2A));
        let json: serde_json::Value =
            serde_json::from_str(&to_json(&MessageOutput::new(&message))).unwrap();

        assert_eq!(json["payload"], "BB FA 01 2A");
        assert_eq!(json["value"], 0xBBFA_012Au32);
        assert_eq!(json["mode"], 1);
        assert_eq!(json["data"], 42);
    }

    #[test]
    fn status_message_json_omits_mode() {
        let payload = [0x01, 0x02, 0x03, 0x04];
        let mut frame = SYNC.to_vec();
        frame.extend_from_slice(&payload);
        frame.extend_from_slice(&badgelink_frame::complement(payload));

        let message = decode_one(&frame);
        let json: serde_json::Value =
            serde_json::from_str(&to_json(&MessageOutput::new(&message))).unwrap();

        assert_eq!(json["payload"], "01 02 03 04");
        assert!(json.get("mode").is_none());
        assert!(json.get("data").is_none());
    }

    #[test]
    fn byte_cells() {
        assert_eq!(byte_cell(Some(0x0A)), "0x0A");
        assert_eq!(byte_cell(None), "-");
    }
}

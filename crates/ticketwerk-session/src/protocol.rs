// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire protocol spoken with the ticket print service.
//
// Every frame is a JSON object discriminated by `tipo`.  Outbound frames are
// built from typed values; inbound frames are decoded leniently: a frame the
// service sends with an unknown `tipo`, or with fields we cannot read, is
// passed through as informational text rather than rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use ticketwerk_core::document::TicketDocument;
use ticketwerk_core::error::{Result, TicketError};
use ticketwerk_core::types::{
    DEFAULT_QUEUE_CAPACITY, JobId, PrinterInfo, PrinterSummary, QueueSnapshot,
};

// ---------------------------------------------------------------------------
// Outbound (console -> service)
// ---------------------------------------------------------------------------

/// A frame sent to the print service.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum OutboundFrame<'a> {
    /// Submit a ticket document as a print job.
    Ticket {
        id: &'a JobId,
        datos: &'a TicketDocument,
    },
    /// Ask the service to enumerate its printers.
    GetPrinters,
    /// Liveness probe, answered with `pong`.
    Ping { id: &'a str },
    /// Ask for a queue snapshot.
    Status,
}

impl OutboundFrame<'_> {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Wire discriminator, for logging.
    pub fn tipo(&self) -> &'static str {
        match self {
            Self::Ticket { .. } => "ticket",
            Self::GetPrinters => "get_printers",
            Self::Ping { .. } => "ping",
            Self::Status => "status",
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound (service -> console)
// ---------------------------------------------------------------------------

/// Job entered the service queue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AckFrame {
    pub id: JobId,
    #[serde(default)]
    pub current: u32,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default)]
    pub mensaje: Option<String>,
}

/// Terminal outcome of a job.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResultFrame {
    pub id: JobId,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub mensaje: String,
}

impl ResultFrame {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Error not tied to a job's lifecycle (validation, auth, queue full).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorFrame {
    /// Present when the service could attribute the error to a submission.
    #[serde(default)]
    pub id: Option<JobId>,
    #[serde(default)]
    pub mensaje: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusFrame {
    #[serde(default)]
    pub current: u32,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default)]
    pub mensaje: Option<String>,
}

impl StatusFrame {
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            current: self.current,
            capacity: self.capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrintersFrame {
    #[serde(default)]
    pub printers: Vec<PrinterInfo>,
    #[serde(default)]
    pub summary: Option<PrinterSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct InfoFrame {
    #[serde(default)]
    mensaje: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct PongFrame {
    #[serde(default)]
    id: String,
}

fn default_capacity() -> u32 {
    DEFAULT_QUEUE_CAPACITY
}

/// A decoded, structured inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Info { message: String },
    Ack(AckFrame),
    Result(ResultFrame),
    Error(ErrorFrame),
    Pong { id: String },
    Status(StatusFrame),
    Printers(PrintersFrame),
    /// Unrecognised `tipo`, or a known `tipo` whose fields did not decode.
    Unknown(Value),
}

/// Outcome of decoding one raw frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Event(InboundEvent),
    /// Not a JSON object; carried as plain text.
    Raw(String),
}

/// Decode one inbound text frame.
///
/// Missing `tipo` means `info`; the discriminator is compared
/// case-insensitively.
pub fn decode(text: &str) -> Inbound {
    let value = match parse_object(text) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, len = text.len(), "passing frame through as text");
            return Inbound::Raw(text.to_string());
        }
    };

    let tipo = value
        .get("tipo")
        .and_then(Value::as_str)
        .unwrap_or("info")
        .to_ascii_lowercase();

    let event = match tipo.as_str() {
        "info" => InfoFrame::deserialize(&value).ok().map(|f| InboundEvent::Info {
            message: f.mensaje.unwrap_or_else(|| value.to_string()),
        }),
        "ack" => AckFrame::deserialize(&value).ok().map(InboundEvent::Ack),
        "result" => ResultFrame::deserialize(&value).ok().map(InboundEvent::Result),
        "error" => ErrorFrame::deserialize(&value).ok().map(InboundEvent::Error),
        "pong" => PongFrame::deserialize(&value)
            .ok()
            .map(|f| InboundEvent::Pong { id: f.id }),
        "status" => StatusFrame::deserialize(&value).ok().map(InboundEvent::Status),
        "printers" => PrintersFrame::deserialize(&value).ok().map(InboundEvent::Printers),
        _ => None,
    };

    Inbound::Event(event.unwrap_or(InboundEvent::Unknown(value)))
}

/// Parse a frame that must be a JSON object.
fn parse_object(text: &str) -> Result<Value> {
    match serde_json::from_str(text) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(TicketError::Protocol(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(TicketError::Protocol(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ticketwerk_core::document::{Command, PrinterProfile};

    fn feed_doc() -> TicketDocument {
        TicketDocument {
            version: "1.0".into(),
            profile: PrinterProfile::new("58mm PT-210", 58.0),
            commands: vec![Command::feed(3)],
        }
    }

    #[test]
    fn ticket_frame_shape() {
        let id = JobId::from("job-1");
        let doc = feed_doc();
        let frame = OutboundFrame::Ticket { id: &id, datos: &doc };
        let value: Value = serde_json::from_str(&frame.to_json().expect("json")).expect("parse");
        assert_eq!(value["tipo"], "ticket");
        assert_eq!(value["id"], "job-1");
        assert_eq!(value["datos"]["profile"]["model"], "58mm PT-210");
        assert_eq!(value["datos"]["commands"][0], json!({"type": "feed", "data": {"lines": 3}}));
    }

    #[test]
    fn control_frames_shape() {
        assert_eq!(
            OutboundFrame::GetPrinters.to_json().expect("json"),
            r#"{"tipo":"get_printers"}"#
        );
        assert_eq!(OutboundFrame::Status.to_json().expect("json"), r#"{"tipo":"status"}"#);
        assert_eq!(
            OutboundFrame::Ping { id: "ping-1" }.to_json().expect("json"),
            r#"{"tipo":"ping","id":"ping-1"}"#
        );
    }

    #[test]
    fn ack_defaults_queue_position() {
        // The service omits zero-valued fields.
        match decode(r#"{"tipo":"ack","id":"job-1","status":"queued"}"#) {
            Inbound::Event(InboundEvent::Ack(ack)) => {
                assert_eq!(ack.id.as_str(), "job-1");
                assert_eq!(ack.current, 0);
                assert_eq!(ack.capacity, 100);
            }
            other => panic!("expected ack, got {other:?}"),
        }
    }

    #[test]
    fn result_frame_decodes() {
        match decode(r#"{"tipo":"result","id":"job-1","status":"success","mensaje":"done"}"#) {
            Inbound::Event(InboundEvent::Result(r)) => {
                assert!(r.is_success());
                assert_eq!(r.mensaje, "done");
            }
            other => panic!("expected result, got {other:?}"),
        }
    }

    #[test]
    fn tipo_is_case_insensitive_and_defaults_to_info() {
        assert!(matches!(
            decode(r#"{"tipo":"PONG","id":"p"}"#),
            Inbound::Event(InboundEvent::Pong { .. })
        ));
        match decode(r#"{"mensaje":"hola"}"#) {
            Inbound::Event(InboundEvent::Info { message }) => assert_eq!(message, "hola"),
            other => panic!("expected info, got {other:?}"),
        }
    }

    #[test]
    fn info_without_message_carries_whole_frame() {
        match decode(r#"{"tipo":"info","status":"connected"}"#) {
            Inbound::Event(InboundEvent::Info { message }) => assert!(message.contains("connected")),
            other => panic!("expected info, got {other:?}"),
        }
    }

    #[test]
    fn unknown_tipo_passes_through() {
        assert!(matches!(
            decode(r#"{"tipo":"telemetry","x":1}"#),
            Inbound::Event(InboundEvent::Unknown(_))
        ));
    }

    #[test]
    fn ack_without_id_passes_through() {
        assert!(matches!(
            decode(r#"{"tipo":"ack","current":1}"#),
            Inbound::Event(InboundEvent::Unknown(_))
        ));
    }

    #[test]
    fn non_json_is_raw_text() {
        assert_eq!(decode("hello there"), Inbound::Raw("hello there".into()));
        assert_eq!(decode("[1,2]"), Inbound::Raw("[1,2]".into()));
    }

    #[test]
    fn non_object_frames_are_protocol_errors() {
        assert!(matches!(
            parse_object("[1,2]"),
            Err(TicketError::Protocol(msg)) if msg.contains("an array")
        ));
        assert!(matches!(parse_object("hello"), Err(TicketError::Protocol(_))));
        assert!(parse_object(r#"{"tipo":"status"}"#).is_ok());
    }

    #[test]
    fn printers_frame_decodes_with_summary() {
        let text = r#"{"tipo":"printers","status":"ok","printers":[
            {"name":"EPSON TM-T20","port":"USB001","driver":"EPSON","status":"ready",
             "is_default":true,"is_virtual":false,"printer_type":"thermal"}],
            "summary":{"status":"ok","detected_count":1,"thermal_count":1,"default_name":"EPSON TM-T20"}}"#;
        match decode(text) {
            Inbound::Event(InboundEvent::Printers(p)) => {
                assert_eq!(p.printers.len(), 1);
                assert!(p.printers[0].is_default);
                assert_eq!(p.summary.expect("summary").thermal_count, 1);
            }
            other => panic!("expected printers, got {other:?}"),
        }
    }
}

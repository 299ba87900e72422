// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ticket document model.
//
// A ticket document is the unit of work submitted to the print service: a
// printer profile plus an ordered list of commands.  The order of `commands`
// is the print order.  Known payloads are carried as typed structs so the
// console can build documents programmatically.  Anything else, including a
// known kind whose payload is incomplete, is kept verbatim as JSON: whether a
// payload is printable is the service's call, not ours.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A complete ticket document.
///
/// Every top-level field defaults when absent or `null` so that such a
/// document still parses and the validator can report which field is
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub profile: PrinterProfile,
    #[serde(default, deserialize_with = "null_as_default")]
    pub commands: Vec<Command>,
}

/// Read `null` the same way as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TicketDocument {
    /// Parse a document from its JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Pretty-printed JSON, as an operator would edit it.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Printer capability/configuration descriptor attached to a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrinterProfile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,
    /// Paper width in millimetres (58 and 80 are the common roll widths).
    #[serde(default, deserialize_with = "null_as_default")]
    pub paper_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_qr: Option<bool>,
    /// Capability flags this crate does not model explicitly.
    #[serde(flatten)]
    pub capabilities: Map<String, Value>,
}

impl PrinterProfile {
    pub fn new(model: impl Into<String>, paper_width: f64) -> Self {
        Self {
            model: model.into(),
            paper_width,
            ..Default::default()
        }
    }
}

/// Horizontal alignment shared by text, barcode, QR and table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One instruction within a ticket document.
///
/// Wire shape: `{"type": "<kind>", "data": {...}}`.  Elements that do not
/// match a typed payload exactly land in [`Command::Other`] and are sent
/// back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Command {
    Text(TextCommand),
    Separator(SeparatorCommand),
    Table(TableCommand),
    Barcode(BarcodeCommand),
    Qr(QrCommand),
    Raw(RawCommand),
    Feed(FeedCommand),
    Cut(CutCommand),
    Beep(BeepCommand),
    /// Any other element of `commands`, kept as it was written.
    #[serde(untagged)]
    Other(Value),
}

impl Command {
    /// Wire name of this command's kind.  `Other` reports its own `type`
    /// field, or `"unknown"`.
    pub fn kind(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Separator(_) => "separator",
            Self::Table(_) => "table",
            Self::Barcode(_) => "barcode",
            Self::Qr(_) => "qr",
            Self::Raw(_) => "raw",
            Self::Feed(_) => "feed",
            Self::Cut(_) => "cut",
            Self::Beep(_) => "beep",
            Self::Other(value) => value.get("type").and_then(Value::as_str).unwrap_or("unknown"),
        }
    }

    pub fn feed(lines: u32) -> Self {
        Self::Feed(FeedCommand { lines })
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextCommand {
    pub content: TextContent,
    /// Optional left-hand label ("Fecha: ...").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<TextLabel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextContent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_style: Option<TextStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextLabel {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    /// Character magnification as `WxH`, e.g. `"2x1"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeparatorCommand {
    #[serde(rename = "char")]
    pub glyph: String,
    pub length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableCommand {
    pub definition: TableDefinition,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_headers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<TableOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDefinition {
    pub columns: Vec<TableColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableColumn {
    pub name: String,
    pub width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_wrap: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_spacing: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BarcodeCommand {
    /// Symbology name as understood by the service (`code128`, `ean13`, ...).
    pub symbology: String,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hri_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QrCommand {
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_width: Option<u32>,
    /// Error-correction level (`L`, `M`, `Q`, `H`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    /// Base64 image embedded in the centre of the code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circle_shape: Option<bool>,
}

/// Low-level escape hatch: bytes sent to the printer verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCommand {
    /// Hex-encoded bytes, optionally space separated (`"1B 40"`).
    pub hex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub safe_mode: bool,
}

impl RawCommand {
    /// Decode the hex sequence, ignoring whitespace between byte pairs.
    pub fn bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        let compact: String = self.hex.chars().filter(|c| !c.is_whitespace()).collect();
        hex::decode(compact)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedCommand {
    pub lines: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutMode {
    Partial,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CutCommand {
    pub mode: CutMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BeepCommand {
    pub times: u32,
    /// Delay between beeps, in the printer's own time unit.
    pub lapse: u32,
}

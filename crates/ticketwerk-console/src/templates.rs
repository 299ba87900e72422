// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in ticket templates for exercising a printer without writing JSON.

use chrono::Local;
use serde_json::{Value, json};

use ticketwerk_core::document::TicketDocument;
use ticketwerk_core::error::Result;

/// The built-in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Connection check: heading, timestamp, cut.
    Simple,
    Receipt,
    Barcode,
    /// Parking ticket with a payment QR code.
    Qr,
    /// Kitchen order with nested item rows.
    Table,
    /// Raw ESC/POS initialisation plus a beep.
    Raw,
    /// Single beep; cheap enough to send in bursts.
    Burstable,
}

impl Template {
    pub const ALL: [Template; 7] = [
        Self::Simple,
        Self::Receipt,
        Self::Barcode,
        Self::Qr,
        Self::Table,
        Self::Raw,
        Self::Burstable,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Receipt => "receipt",
            Self::Barcode => "barcode",
            Self::Qr => "qr",
            Self::Table => "table",
            Self::Raw => "raw",
            Self::Burstable => "burstable",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Build the document.  Date-stamped templates use the local clock.
    pub fn document(self) -> Result<TicketDocument> {
        Ok(serde_json::from_value(self.json())?)
    }

    fn json(self) -> Value {
        let now = Local::now();
        let profile = json!({"model": "58mm PT-210", "paper_width": 58});

        match self {
            Self::Simple => json!({
                "version": "1.0",
                "profile": profile,
                "commands": [
                    {"type": "text", "data": {"content": {"text": "CONNECTION TEST", "align": "center",
                        "content_style": {"bold": true, "size": "2x1"}}}},
                    {"type": "text", "data": {"content": {
                        "text": now.format("%Y-%m-%d %H:%M:%S").to_string(), "align": "center"}}},
                    {"type": "feed", "data": {"lines": 3}},
                    {"type": "cut", "data": {"mode": "partial"}}
                ]
            }),

            Self::Receipt => json!({
                "version": "1.0",
                "profile": profile,
                "commands": [
                    {"type": "text", "data": {"content": {"text": "MY STORE", "align": "center",
                        "content_style": {"bold": true, "size": "2x2"}}}},
                    {"type": "text", "data": {"content": {"text": "123 Main Street", "align": "center"}}},
                    {"type": "separator", "data": {"char": "-", "length": 32}},
                    {"type": "text", "data": {"label": {"text": "Date"},
                        "content": {"text": now.format("%Y-%m-%d").to_string()}}},
                    {"type": "text", "data": {"label": {"text": "Time"},
                        "content": {"text": now.format("%H:%M:%S").to_string()}}},
                    {"type": "separator", "data": {"char": ".", "length": 32}},
                    {"type": "table", "data": {
                        "definition": {"columns": [
                            {"name": "Item", "width": 16},
                            {"name": "Price", "width": 10, "align": "right"}]},
                        "rows": [["Coffee", "$35.00"], ["Muffin", "$25.00"]],
                        "options": {"header_bold": true}}},
                    {"type": "separator", "data": {"char": "-", "length": 32}},
                    {"type": "text", "data": {"content": {"text": "TOTAL: $60.00", "align": "right",
                        "content_style": {"bold": true}}}},
                    {"type": "feed", "data": {"lines": 1}},
                    {"type": "text", "data": {"content": {"text": "Thank you for your purchase!", "align": "center"}}},
                    {"type": "feed", "data": {"lines": 3}},
                    {"type": "cut", "data": {"mode": "partial"}}
                ]
            }),

            Self::Barcode => json!({
                "version": "1.0",
                "profile": profile,
                "commands": [
                    {"type": "text", "data": {"content": {"text": "BARCODE TEST", "align": "center",
                        "content_style": {"bold": true}}}},
                    {"type": "feed", "data": {"lines": 1}},
                    {"type": "barcode", "data": {"symbology": "code128", "data": "ABC123456",
                        "height": 60, "hri_position": "below", "align": "center"}},
                    {"type": "feed", "data": {"lines": 3}},
                    {"type": "cut", "data": {"mode": "partial"}}
                ]
            }),

            Self::Qr => json!({
                "version": "1.0",
                "profile": {"model": "58mm PT-210", "paper_width": 58, "code_table": "WPC1252",
                    "dpi": 203, "has_qr": true},
                "commands": [
                    {"type": "text", "data": {"content": {"text": "P", "align": "center",
                        "content_style": {"bold": true, "size": "4x4"}}}},
                    {"type": "text", "data": {"content": {"text": "CENTRE PLAZA", "align": "center",
                        "content_style": {"bold": true, "size": "1x1"}}}},
                    {"type": "feed", "data": {"lines": 1}},
                    {"type": "separator", "data": {"char": "-", "length": 32}},
                    {"type": "table", "data": {
                        "definition": {"columns": [
                            {"name": "Field", "width": 14, "align": "left"},
                            {"name": "Value", "width": 16, "align": "right"}]},
                        "show_headers": false,
                        "rows": [["Entry:", now.format("%d/%m %H:%M").to_string()],
                                 ["Plate:", "XK-99-22"], ["Ticket:", "#902102"]],
                        "options": {"column_spacing": 1}}},
                    {"type": "separator", "data": {"char": "-", "length": 32}},
                    {"type": "qr", "data": {"data": "https://pay.example.com/t/902102",
                        "human_text": "SCAN TO PAY", "pixel_width": 240, "correction": "H",
                        "align": "center", "circle_shape": false}},
                    {"type": "feed", "data": {"lines": 1}},
                    {"type": "text", "data": {"content": {"text": "Open 24 hours", "align": "center",
                        "content_style": {"bold": true}}}},
                    {"type": "feed", "data": {"lines": 3}},
                    {"type": "cut", "data": {"mode": "partial"}}
                ]
            }),

            Self::Table => json!({
                "version": "1.0",
                "profile": {"model": "58mm PT-210", "paper_width": 58, "code_table": "WPC1252", "dpi": 203},
                "commands": [
                    {"type": "text", "data": {"content": {"text": "== KITCHEN ORDER ==", "align": "center",
                        "content_style": {"bold": true, "size": "1x1"}}}},
                    {"type": "separator", "data": {"char": "=", "length": 32}},
                    {"type": "table", "data": {
                        "definition": {"columns": [
                            {"name": "No.", "width": 4, "align": "left"},
                            {"name": "ITEM", "width": 18, "align": "left"},
                            {"name": "PRICE", "width": 8, "align": "right"}]},
                        "show_headers": true,
                        "rows": [
                            ["001", "Family pizza 16\"", "$250.00"],
                            ["", " |_ Extra cheese", "$30.00"],
                            ["", " |_ Soda 2L", "$25.00"],
                            ["002", "Burger DX", "$120.00"],
                            ["", " |_ Large fries", "$35.00"]],
                        "options": {"header_bold": true, "word_wrap": true, "column_spacing": 1}}},
                    {"type": "separator", "data": {"char": "-", "length": 32}},
                    {"type": "table", "data": {
                        "definition": {"columns": [
                            {"name": "", "width": 22, "align": "left"},
                            {"name": "", "width": 8, "align": "right"}]},
                        "show_headers": false,
                        "rows": [["Subtotal:", "$460.00"], ["Tax (16%):", "$73.60"], ["TOTAL:", "$533.60"]],
                        "options": {"header_bold": false, "column_spacing": 1}}},
                    {"type": "feed", "data": {"lines": 1}},
                    {"type": "barcode", "data": {"symbology": "code128", "data": "2024011601",
                        "width": 2, "height": 60, "hri_position": "below", "align": "center"}},
                    {"type": "feed", "data": {"lines": 2}},
                    {"type": "cut", "data": {"mode": "partial"}}
                ]
            }),

            Self::Raw => json!({
                "version": "1.0",
                "profile": profile,
                "commands": [
                    {"type": "raw", "data": {"hex": "1B 40", "comment": "Initialise printer", "safe_mode": true}},
                    {"type": "text", "data": {"content": {"text": "RAW command executed!", "align": "center"}}},
                    {"type": "beep", "data": {"times": 2, "lapse": 1}},
                    {"type": "feed", "data": {"lines": 3}},
                    {"type": "cut", "data": {"mode": "partial"}}
                ]
            }),

            Self::Burstable => json!({
                "version": "1.0",
                "profile": profile,
                "commands": [
                    {"type": "beep", "data": {"times": 1, "lapse": 1}}
                ]
            }),
        }
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ticketwerk: ticket document model, validation, and the core types shared
// by the session layer and the operator console.

pub mod config;
pub mod document;
pub mod error;
pub mod human_errors;
pub mod types;
pub mod validate;

pub use config::ClientConfig;
pub use document::{Command, PrinterProfile, TicketDocument};
pub use error::{TicketError, ValidationError};
pub use types::*;
pub use validate::validate;

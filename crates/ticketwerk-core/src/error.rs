// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Ticketwerk.

use thiserror::Error;

/// The first structural rule a ticket document violates.
///
/// Rules are checked in declaration order; only the first failure is ever
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing version")]
    MissingVersion,

    #[error("missing profile.model")]
    MissingProfileModel,

    #[error("missing commands")]
    MissingCommands,
}

/// Top-level error type for all Ticketwerk operations.
#[derive(Debug, Error)]
pub enum TicketError {
    // -- Submission --
    /// Displays as the rule message itself, e.g. "missing version".
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("not connected to the print service")]
    NotConnected,

    // -- Transport / protocol --
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed frame: {0}")]
    Protocol(String),

    #[error("health check failed: {0}")]
    Health(String),

    #[error("session has been shut down")]
    SessionClosed,

    // -- Local I/O --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TicketError>;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for console operators.
//
// Local errors (`TicketError`) and the free-text `error` frames sent by the
// print service are both mapped to a short message plus a suggestion.  The
// severity drives how the console presents them.

use std::fmt;

use crate::error::{TicketError, ValidationError};

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Connection blip or busy queue; trying again later is enough.
    Transient,
    /// The operator must fix something (the document, the token).
    ActionRequired,
    /// Retrying will not help.
    Permanent,
}

impl Severity {
    /// Short tag shown in front of the message.
    pub fn label(self) -> &'static str {
        match self {
            Self::Transient => "retry",
            Self::ActionRequired => "action",
            Self::Permanent => "error",
        }
    }
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    /// Whether resubmitting unchanged could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// `(tag) message suggestion`, plus a retry hint when resubmitting can help.
impl fmt::Display for HumanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {} {}", self.severity.label(), self.message, self.suggestion)?;
        if self.retriable {
            write!(f, " Safe to retry.")?;
        }
        Ok(())
    }
}

/// Class of an `error` frame sent by the print service.
///
/// All classes travel through the same error channel; the class only picks
/// the presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    Authentication,
    RateLimited,
    QueueFull,
    Other,
}

/// Classify service error text by the phrases the service is known to use.
pub fn classify_service_error(message: &str) -> ServiceErrorKind {
    if message.contains("Authentication failed") {
        ServiceErrorKind::Authentication
    } else if message.contains("Rate limited") {
        ServiceErrorKind::RateLimited
    } else if message.to_ascii_lowercase().contains("queue full") {
        ServiceErrorKind::QueueFull
    } else {
        ServiceErrorKind::Other
    }
}

/// Convert a service `error` frame into a `HumanError`.
pub fn humanize_service_error(message: &str) -> HumanError {
    match classify_service_error(message) {
        ServiceErrorKind::Authentication => HumanError {
            message: "The print service rejected our credentials.".into(),
            suggestion: "Check the auth token configured for this console.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        ServiceErrorKind::RateLimited => HumanError {
            message: "Too many requests were sent too quickly.".into(),
            suggestion: "Wait a few seconds before submitting again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
        ServiceErrorKind::QueueFull => HumanError {
            message: "The print queue is full.".into(),
            suggestion: "Wait for queued tickets to print, then resubmit.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
        ServiceErrorKind::Other => HumanError {
            message: "The print service reported an error.".into(),
            suggestion: message.to_string(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// Convert a `TicketError` into a `HumanError`.
pub fn humanize_error(err: &TicketError) -> HumanError {
    match err {
        TicketError::Validation(v) => HumanError {
            message: "This ticket document is incomplete.".into(),
            suggestion: match v {
                ValidationError::MissingVersion => "Add a \"version\" field, e.g. \"1.0\".",
                ValidationError::MissingProfileModel => {
                    "Set \"profile.model\" to the printer model name."
                }
                ValidationError::MissingCommands => "Add at least one command to \"commands\".",
            }
            .into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        TicketError::NotConnected => HumanError {
            message: "Not connected to the print service.".into(),
            suggestion: "The console reconnects automatically. Try again once it shows connected.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        TicketError::Transport(detail) => HumanError {
            message: "The connection to the print service failed.".into(),
            suggestion: format!("Check the service is running and reachable. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        TicketError::Protocol(_) => HumanError {
            message: "The print service sent something we couldn't read.".into(),
            suggestion: "Make sure the console and service versions match.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        TicketError::Health(_) => HumanError {
            message: "The print service is not answering health checks.".into(),
            suggestion: "It may be restarting. Status will refresh automatically.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        TicketError::SessionClosed => HumanError {
            message: "This session has ended.".into(),
            suggestion: "Restart the console.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        TicketError::Config(detail) => HumanError {
            message: "The console configuration is invalid.".into(),
            suggestion: detail.clone(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        TicketError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: io_err.to_string(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        TicketError::Serialization(detail) => HumanError {
            message: "This isn't valid JSON.".into(),
            suggestion: format!("Fix the syntax error and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

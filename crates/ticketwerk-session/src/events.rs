// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Externally observable session events.

use ticketwerk_core::human_errors::ServiceErrorKind;
use ticketwerk_core::types::{
    ConnectionState, HealthState, Job, JobId, LogCategory, Notification, PrinterInventory,
    QueueSnapshot,
};

/// Everything a session reports to its presentation layer, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Connection(ConnectionState),
    /// One activity-log line.
    Log { category: LogCategory, message: String },
    /// A short-lived user notification.
    Notify(Notification),
    Queue(QueueSnapshot),
    /// A job changed state.
    Job(Job),
    Printers(PrinterInventory),
    Health(HealthState),
    /// An `error` frame from the service.  Never changes any job.
    ServiceError {
        kind: ServiceErrorKind,
        id: Option<JobId>,
        message: String,
    },
}

impl SessionEvent {
    pub fn log(category: LogCategory, message: impl Into<String>) -> Self {
        Self::Log {
            category,
            message: message.into(),
        }
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Ticketwerk session layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a submitted job, unique within a session.
///
/// The service echoes this string back in `ack` and `result` frames, so it
/// is kept as an opaque string rather than a parsed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle states of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Sent, not yet acknowledged by the service.
    Pending,
    /// The service accepted the job into its queue.
    Acknowledged,
    /// Printed.
    Succeeded,
    /// The service reported failure, or the submission frame never left.
    Failed,
}

impl JobStatus {
    /// Terminal jobs accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// A locally submitted job and its last known state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Last message the service attached to this job.
    pub last_message: Option<String>,
    /// Number of commands in the submitted document.
    pub command_count: usize,
}

impl Job {
    pub fn new(id: JobId, command_count: usize) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Pending,
            submitted_at: now,
            updated_at: now,
            last_message: None,
            command_count,
        }
    }
}

/// State of the single transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Never connected.
    Idle,
    /// Handshake in progress.
    Connecting,
    Open,
    /// Waiting out the reconnect delay.
    Reconnecting,
    Closed,
}

impl ConnectionState {
    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Closed => "disconnected",
        };
        f.write_str(label)
    }
}

/// Queue occupancy reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub current: u32,
    pub capacity: u32,
}

/// Occupancy above this percentage is shown as a warning.
pub const QUEUE_WARNING_PERCENT: u32 = 70;

/// Capacity assumed when the service omits it.
pub const DEFAULT_QUEUE_CAPACITY: u32 = 100;

impl Default for QueueSnapshot {
    fn default() -> Self {
        Self {
            current: 0,
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl QueueSnapshot {
    /// Occupancy as a rounded percentage.
    pub fn percent(&self) -> u32 {
        if self.capacity == 0 {
            return 0;
        }
        ((f64::from(self.current) / f64::from(self.capacity)) * 100.0).round() as u32
    }

    pub fn is_warning(&self) -> bool {
        self.percent() > QUEUE_WARNING_PERCENT
    }
}

impl std::fmt::Display for QueueSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.current, self.capacity)
    }
}

/// A printer known to the print service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterInfo {
    pub name: String,
    pub port: String,
    pub status: String,
    pub printer_type: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(default)]
    pub is_virtual: bool,
}

impl PrinterInfo {
    pub fn is_thermal(&self) -> bool {
        self.printer_type == "thermal"
    }
}

/// Service-side overview attached to printer listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterSummary {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub detected_count: u32,
    #[serde(default)]
    pub thermal_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_name: Option<String>,
}

/// Printers split for display: thermal receipt printers first, everything
/// else (virtual, office) second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrinterInventory {
    pub thermal: Vec<PrinterInfo>,
    pub other: Vec<PrinterInfo>,
    pub summary: Option<PrinterSummary>,
}

impl PrinterInventory {
    pub fn from_printers(printers: Vec<PrinterInfo>, summary: Option<PrinterSummary>) -> Self {
        let (thermal, other) = printers.into_iter().partition(PrinterInfo::is_thermal);
        Self {
            thermal,
            other,
            summary,
        }
    }

    pub fn total(&self) -> usize {
        self.thermal.len() + self.other.len()
    }
}

/// Worker counters from the health endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub running: bool,
    pub jobs_processed: u64,
    pub jobs_failed: u64,
}

/// Build stamp of the service binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub env: String,
    pub date: String,
    pub time: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            env: "unknown".into(),
            date: "--".into(),
            time: String::new(),
        }
    }
}

/// Normalised health report.  Every field has a safe value even when the
/// service omitted it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub queue: QueueSnapshot,
    pub worker: WorkerStats,
    pub build: BuildInfo,
    pub uptime_seconds: u64,
}

/// Last observed health of the print service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthState {
    /// No probe has completed yet.
    Unknown,
    Reachable(HealthReport),
    /// The probe failed; shown as offline until the next tick succeeds.
    Unreachable { reason: String },
}

/// Format an uptime as `1h 5m`, `5m 3s` or `3s`.
pub fn format_uptime(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h}h {m}m")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A short user-visible notification (a "toast").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notification {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Category of an activity-log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogCategory {
    Info,
    Sent,
    Ack,
    Result,
    Error,
    Pong,
    Status,
    Printers,
}

impl std::fmt::Display for LogCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Info => "INFO",
            Self::Sent => "SENT",
            Self::Ack => "ACK",
            Self::Result => "RESULT",
            Self::Error => "ERROR",
            Self::Pong => "PONG",
            Self::Status => "STATUS",
            Self::Printers => "PRINTERS",
        };
        f.write_str(label)
    }
}

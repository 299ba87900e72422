// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Console state: what the operator currently sees, folded from session
// events.

use ticketwerk_core::human_errors::humanize_service_error;
use ticketwerk_core::types::{
    ConnectionState, HealthState, NoticeLevel, PrinterInventory, QueueSnapshot, format_uptime,
};
use ticketwerk_session::SessionEvent;

use crate::activity_log::ActivityLog;

#[derive(Debug)]
pub struct ConsoleState {
    pub log: ActivityLog,
    pub connection: ConnectionState,
    pub queue: QueueSnapshot,
    pub health: HealthState,
    pub printers: Option<PrinterInventory>,
}

impl ConsoleState {
    pub fn new(max_log_entries: usize) -> Self {
        Self {
            log: ActivityLog::new(max_log_entries),
            connection: ConnectionState::Idle,
            queue: QueueSnapshot::default(),
            health: HealthState::Unknown,
            printers: None,
        }
    }

    /// Fold one event into the state.  Returns the lines to show the
    /// operator right away.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<String> {
        match event {
            SessionEvent::Connection(state) => {
                self.connection = state;
                Vec::new()
            }
            SessionEvent::Log { category, message } => {
                vec![self.log.push(category, message).to_string()]
            }
            SessionEvent::Notify(notice) => {
                let tag = match notice.level {
                    NoticeLevel::Info => "info",
                    NoticeLevel::Success => "ok",
                    NoticeLevel::Warning => "warn",
                    NoticeLevel::Error => "error",
                };
                vec![format!("  ({tag}) {}", notice.message)]
            }
            SessionEvent::Queue(queue) => {
                self.queue = queue;
                if queue.is_warning() {
                    vec![format!("  (warn) queue at {}% ({queue})", queue.percent())]
                } else {
                    Vec::new()
                }
            }
            SessionEvent::Job(_) => Vec::new(),
            SessionEvent::Printers(inventory) => {
                self.printers = Some(inventory);
                Vec::new()
            }
            SessionEvent::Health(health) => {
                let was_reachable = matches!(self.health, HealthState::Reachable(_));
                let lines = match &health {
                    HealthState::Reachable(report) => {
                        // Background probes feed the queue display too.
                        self.queue = report.queue;
                        if was_reachable {
                            Vec::new()
                        } else {
                            vec!["  (ok) health endpoint reachable".to_string()]
                        }
                    }
                    HealthState::Unreachable { reason } if was_reachable
                        || self.health == HealthState::Unknown =>
                    {
                        vec![format!("  (error) service offline: {reason}")]
                    }
                    _ => Vec::new(),
                };
                self.health = health;
                lines
            }
            SessionEvent::ServiceError { message, .. } => {
                vec![format!("  {}", humanize_service_error(&message))]
            }
        }
    }

    /// Dashboard summary for the `health` command.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![
            format!("connection : {}", self.connection),
            format!(
                "queue      : {} ({}%){}",
                self.queue,
                self.queue.percent(),
                if self.queue.is_warning() { " busy" } else { "" }
            ),
        ];
        match &self.health {
            HealthState::Unknown => lines.push("service    : not probed yet".into()),
            HealthState::Unreachable { reason } => {
                lines.push(format!("service    : offline ({reason})"));
            }
            HealthState::Reachable(report) => {
                lines.push(format!(
                    "worker     : {} ({} processed, {} failed)",
                    if report.worker.running { "running" } else { "stopped" },
                    report.worker.jobs_processed,
                    report.worker.jobs_failed
                ));
                lines.push(format!(
                    "build      : {} {} {}",
                    report.build.env.to_uppercase(),
                    report.build.date,
                    report.build.time
                ));
                lines.push(format!("uptime     : {}", format_uptime(report.uptime_seconds)));
            }
        }
        if let Some(printers) = &self.printers {
            lines.push(format!(
                "printers   : {} thermal, {} other",
                printers.thermal.len(),
                printers.other.len()
            ));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketwerk_core::human_errors::ServiceErrorKind;
    use ticketwerk_core::types::{HealthReport, LogCategory, Notification};

    #[test]
    fn log_events_land_in_the_activity_log() {
        let mut state = ConsoleState::new(200);
        let lines = state.apply(SessionEvent::log(LogCategory::Sent, "Job: job-1"));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("SENT: Job: job-1"));
        assert_eq!(state.log.len(), 1);
    }

    #[test]
    fn busy_queue_is_flagged() {
        let mut state = ConsoleState::new(200);
        assert!(state
            .apply(SessionEvent::Queue(QueueSnapshot { current: 3, capacity: 100 }))
            .is_empty());
        let lines = state.apply(SessionEvent::Queue(QueueSnapshot { current: 90, capacity: 100 }));
        assert_eq!(lines, vec!["  (warn) queue at 90% (90 / 100)".to_string()]);
    }

    #[test]
    fn health_transitions_are_announced_once() {
        let mut state = ConsoleState::new(200);
        let up = SessionEvent::Health(HealthState::Reachable(HealthReport::default()));
        assert_eq!(state.apply(up.clone()).len(), 1);
        assert!(state.apply(up).is_empty());

        let down = SessionEvent::Health(HealthState::Unreachable { reason: "refused".into() });
        assert_eq!(state.apply(down.clone()).len(), 1);
        assert!(state.apply(down).is_empty());
        assert!(state.summary().iter().any(|l| l.contains("offline (refused)")));
    }

    #[test]
    fn service_errors_get_a_suggestion() {
        let mut state = ConsoleState::new(200);
        let lines = state.apply(SessionEvent::ServiceError {
            kind: ServiceErrorKind::Authentication,
            id: None,
            message: "Authentication failed".into(),
        });
        assert!(lines[0].contains("auth token"));
    }

    #[test]
    fn notifications_are_tagged_by_level() {
        let mut state = ConsoleState::new(200);
        let lines = state.apply(SessionEvent::Notify(Notification::new(
            NoticeLevel::Error,
            "Connection lost",
        )));
        assert_eq!(lines, vec!["  (error) Connection lost".to_string()]);
    }

    #[test]
    fn summary_formats_uptime() {
        let mut state = ConsoleState::new(200);
        let report = HealthReport {
            uptime_seconds: 3725,
            ..HealthReport::default()
        };
        state.apply(SessionEvent::Health(HealthState::Reachable(report)));
        assert!(state.summary().iter().any(|l| l == "uptime     : 1h 2m"));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Message dispatcher: turns inbound frames into ledger updates and session
// events.
//
// Frames are handled one at a time, in the order the connection delivered
// them.  Nothing here can fail: frames that do not decode become log lines.

use tracing::{debug, warn};

use ticketwerk_core::human_errors::{ServiceErrorKind, classify_service_error};
use ticketwerk_core::types::{
    LogCategory, NoticeLevel, Notification, PrinterInventory, QueueSnapshot,
};

use crate::events::SessionEvent;
use crate::ledger::SharedLedger;
use crate::protocol::{Inbound, InboundEvent, decode};

/// What one frame produced.
#[derive(Debug, Default, PartialEq)]
pub struct Dispatch {
    pub events: Vec<SessionEvent>,
    /// The frame warrants an immediate out-of-band health refresh.
    pub refresh_health: bool,
}

impl Dispatch {
    fn push(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    fn log(&mut self, category: LogCategory, message: impl Into<String>) {
        self.events.push(SessionEvent::log(category, message));
    }
}

pub struct Dispatcher {
    ledger: SharedLedger,
}

impl Dispatcher {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }

    /// Handle one raw inbound frame.
    pub fn dispatch(&self, frame: &str) -> Dispatch {
        match decode(frame) {
            Inbound::Event(event) => self.handle(event),
            Inbound::Raw(text) => {
                let mut out = Dispatch::default();
                out.log(LogCategory::Info, text);
                out
            }
        }
    }

    fn handle(&self, event: InboundEvent) -> Dispatch {
        let mut out = Dispatch::default();

        // Only ack and result touch the ledger; the lock is held for the
        // single transition.
        let updated = match &event {
            InboundEvent::Ack(_) | InboundEvent::Result(_) => self.ledger.lock().apply_event(&event),
            _ => None,
        };

        match event {
            InboundEvent::Info { message } => out.log(LogCategory::Info, message),

            InboundEvent::Ack(ack) => {
                let queue = QueueSnapshot {
                    current: ack.current,
                    capacity: ack.capacity,
                };
                out.log(
                    LogCategory::Ack,
                    format!("Queued: {} (position {}/{})", ack.id, queue.current, queue.capacity),
                );
                if let Some(job) = updated {
                    out.push(SessionEvent::Job(job));
                }
                out.push(SessionEvent::Queue(queue));
                out.refresh_health = true;
            }

            InboundEvent::Result(result) => {
                if result.is_success() {
                    out.log(
                        LogCategory::Result,
                        format!("Completed: {} ({})", result.id, result.mensaje),
                    );
                    out.push(SessionEvent::Notify(Notification::new(
                        NoticeLevel::Success,
                        "Print completed",
                    )));
                } else {
                    out.log(
                        LogCategory::Error,
                        format!("Failed [{}]: {}", result.id, result.mensaje),
                    );
                    out.push(SessionEvent::Notify(Notification::new(
                        NoticeLevel::Error,
                        "Print failed",
                    )));
                }
                match updated {
                    Some(job) => out.push(SessionEvent::Job(job)),
                    None => debug!(job_id = %result.id, "result did not change the ledger"),
                }
                out.refresh_health = true;
            }

            InboundEvent::Error(err) => {
                let kind = classify_service_error(&err.mensaje);
                warn!(?kind, job_id = ?err.id, message = %err.mensaje, "service reported an error");
                let prefix = match kind {
                    ServiceErrorKind::Authentication => "Authentication",
                    ServiceErrorKind::RateLimited => "Rate limit",
                    ServiceErrorKind::QueueFull => "Queue",
                    ServiceErrorKind::Other => "Service",
                };
                out.log(LogCategory::Error, format!("{prefix}: {}", err.mensaje));
                out.push(SessionEvent::Notify(Notification::new(
                    NoticeLevel::Error,
                    err.mensaje.clone(),
                )));
                out.push(SessionEvent::ServiceError {
                    kind,
                    id: err.id,
                    message: err.mensaje,
                });
            }

            InboundEvent::Pong { id } => out.log(LogCategory::Pong, format!("Pong (id: {id})")),

            InboundEvent::Status(status) => {
                let queue = status.snapshot();
                out.log(LogCategory::Status, format!("Queue: {}/{}", queue.current, queue.capacity));
                out.push(SessionEvent::Queue(queue));
            }

            InboundEvent::Printers(listing) => {
                let inventory = PrinterInventory::from_printers(listing.printers, listing.summary);
                out.log(
                    LogCategory::Printers,
                    format!("Found {} printers", inventory.total()),
                );
                out.log(
                    LogCategory::Printers,
                    format!(
                        "Thermal: {}, other: {}",
                        inventory.thermal.len(),
                        inventory.other.len()
                    ),
                );
                for p in &inventory.thermal {
                    let marker = if p.is_default { " (default)" } else { "" };
                    out.log(
                        LogCategory::Printers,
                        format!("{} [{}] {}{marker}", p.name, p.port, p.status),
                    );
                }
                out.push(SessionEvent::Printers(inventory));
            }

            InboundEvent::Unknown(value) => out.log(LogCategory::Info, value.to_string()),
        }

        out
    }
}

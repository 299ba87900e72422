// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ticketwerk session: the live link to the ticket print service.
//
// Connection management with automatic reconnection, the JSON wire
// protocol, the job ledger and the dispatcher that ties inbound frames to
// job state.

pub mod connection;
pub mod dispatcher;
pub mod events;
pub mod health;
pub mod ledger;
pub mod protocol;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use connection::{ConnectionEvent, ConnectionHandle, ConnectionManager};
pub use dispatcher::{Dispatch, Dispatcher};
pub use events::SessionEvent;
pub use health::HealthProbe;
pub use ledger::{JobLedger, SharedLedger};
pub use protocol::{Inbound, InboundEvent, OutboundFrame};
pub use session::{BurstReport, JobCounts, Session};
pub use transport::{Connector, LinkReader, LinkWriter, WsConnector};

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session context: one connection, one ledger, one ordered event stream.
//
// `Session::start` wires the connection manager, the dispatcher pump and
// the optional health poller together and hands back the receiving end of
// the session's event channel.  Dropping the session (or calling
// `shutdown`) tears all of it down.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use ticketwerk_core::config::ClientConfig;
use ticketwerk_core::document::TicketDocument;
use ticketwerk_core::error::{Result, TicketError};
use ticketwerk_core::types::{
    ConnectionState, HealthState, Job, JobId, JobStatus, LogCategory, NoticeLevel, Notification,
};
use ticketwerk_core::validate::validate;

use crate::connection::{ConnectionEvent, ConnectionHandle, ConnectionManager};
use crate::dispatcher::Dispatcher;
use crate::events::SessionEvent;
use crate::health::{HealthProbe, spawn_poller};
use crate::ledger::{IdGenerator, SharedLedger};
use crate::protocol::OutboundFrame;
use crate::transport::{Connector, WsConnector};

/// Outcome of a burst submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BurstReport {
    /// Every job the burst recorded, in submission order.
    pub ids: Vec<JobId>,
    pub sent: usize,
    pub failed: usize,
}

/// Jobs per lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobCounts {
    pub pending: usize,
    pub acknowledged: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Session {
    id: Uuid,
    config: ClientConfig,
    connection: ConnectionHandle,
    ledger: SharedLedger,
    ids: IdGenerator,
    jobs_sent: AtomicU64,
    events: mpsc::UnboundedSender<SessionEvent>,
    refresh: Option<mpsc::Sender<()>>,
    health: Option<HealthProbe>,
    manager: JoinHandle<()>,
    pump: JoinHandle<()>,
    poller: Option<JoinHandle<()>>,
}

impl Session {
    /// Build a session around `connector`.  The connection stays `Idle`
    /// until [`Session::connect`].  Health polling runs only when a probe
    /// is supplied.
    pub fn start<C: Connector>(
        config: ClientConfig,
        connector: C,
        health: Option<HealthProbe>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let id = Uuid::new_v4();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (connection, incoming, manager) =
            ConnectionManager::spawn(connector, config.reconnect_delay());
        let ledger = SharedLedger::new();

        let (refresh, poller) = match &health {
            Some(probe) => {
                let (refresh_tx, refresh_rx) = mpsc::channel(1);
                let task = spawn_poller(
                    probe.clone(),
                    config.health_poll_interval(),
                    refresh_rx,
                    events_tx.clone(),
                );
                (Some(refresh_tx), Some(task))
            }
            None => (None, None),
        };

        let pump = tokio::spawn(pump(
            incoming,
            Dispatcher::new(ledger.clone()),
            events_tx.clone(),
            refresh.clone(),
            config.ws_url(),
        ));

        info!(session = %id, endpoint = %config.ws_url(), "session started");

        let session = Self {
            id,
            config,
            connection,
            ledger,
            ids: IdGenerator::new(),
            jobs_sent: AtomicU64::new(0),
            events: events_tx,
            refresh,
            health,
            manager,
            pump,
            poller,
        };
        (session, events_rx)
    }

    /// Start a WebSocket session for `config` with health polling, and
    /// begin connecting.
    pub fn open_ws(config: ClientConfig) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        let connector = WsConnector::from_config(&config);
        let probe = HealthProbe::from_config(&config)?;
        let (session, events) = Self::start(config, connector, Some(probe));
        session.connect()?;
        Ok((session, events))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn connect(&self) -> Result<()> {
        self.connection.connect()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub async fn wait_for_state(&self, target: ConnectionState) -> Result<()> {
        self.connection.wait_for_state(target).await
    }

    /// Validate `doc`, record it and send it as one job.
    ///
    /// Nothing is recorded when validation fails or the connection is not
    /// open.  If the link drops while the frame is in flight the job stays
    /// in the ledger as `Failed`.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn submit(&self, doc: &TicketDocument) -> Result<JobId> {
        if let Err(e) = validate(doc) {
            warn!(error = %e, "document rejected");
            return Err(e.into());
        }
        self.ensure_open()?;

        let id = self.ledger.lock().submit(doc);
        self.send_ticket(&id, doc).await?;
        Ok(id)
    }

    /// Submit `n` copies of `doc` back to back, each under its own id.
    #[instrument(skip(self, doc), fields(session = %self.id))]
    pub async fn burst(&self, doc: &TicketDocument, n: usize) -> Result<BurstReport> {
        validate(doc)?;
        self.ensure_open()?;

        self.emit(SessionEvent::log(
            LogCategory::Info,
            format!("Burst: sending {n} jobs"),
        ));
        let ids = self.ledger.lock().bulk_submit(doc, n);
        let mut report = BurstReport::default();
        for id in &ids {
            match self.send_ticket(id, doc).await {
                Ok(()) => report.sent += 1,
                Err(_) => report.failed += 1,
            }
        }
        report.ids = ids;

        self.emit(SessionEvent::Notify(Notification::new(
            NoticeLevel::Warning,
            format!("Burst: {} jobs sent", report.sent),
        )));
        info!(sent = report.sent, failed = report.failed, "burst finished");
        Ok(report)
    }

    /// Send a `ping`; the service answers with a `pong` carrying the same id.
    pub async fn ping(&self) -> Result<String> {
        let id = self.ids.next("ping");
        self.send_control(&OutboundFrame::Ping { id: &id }, format!("Ping ({id})"))
            .await?;
        Ok(id)
    }

    pub async fn request_status(&self) -> Result<()> {
        self.send_control(&OutboundFrame::Status, "Status request".into())
            .await
    }

    pub async fn request_printers(&self) -> Result<()> {
        self.send_control(&OutboundFrame::GetPrinters, "Requesting printer list".into())
            .await
    }

    /// Probe the health endpoint now and wait for the answer.
    ///
    /// The result is also published as a `Health` event.  `None` when the
    /// session runs without a probe.
    pub async fn check_health(&self) -> Option<HealthState> {
        let state = self.health.as_ref()?.probe().await;
        self.emit(SessionEvent::Health(state.clone()));
        Some(state)
    }

    /// Snapshot of every job, oldest first.
    pub fn jobs(&self) -> Vec<Job> {
        self.ledger.lock().jobs().to_vec()
    }

    pub fn job(&self, id: &JobId) -> Option<Job> {
        self.ledger.lock().get(id).cloned()
    }

    pub fn job_counts(&self) -> JobCounts {
        let ledger = self.ledger.lock();
        JobCounts {
            pending: ledger.count(JobStatus::Pending),
            acknowledged: ledger.count(JobStatus::Acknowledged),
            succeeded: ledger.count(JobStatus::Succeeded),
            failed: ledger.count(JobStatus::Failed),
        }
    }

    /// Ticket frames that left this session successfully.
    pub fn jobs_sent(&self) -> u64 {
        self.jobs_sent.load(Ordering::Relaxed)
    }

    /// Stop the pump and poller, close the link and wait for the manager.
    pub async fn shutdown(self) {
        self.pump.abort();
        if let Some(poller) = &self.poller {
            poller.abort();
        }
        self.connection.shutdown();
        if let Err(e) = self.manager.await {
            warn!(error = %e, "connection manager did not stop cleanly");
        }
        info!(session = %self.id, "session closed");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.connection.state().is_open() {
            return Ok(());
        }
        self.emit(SessionEvent::Notify(Notification::new(
            NoticeLevel::Error,
            "Not connected",
        )));
        Err(TicketError::NotConnected)
    }

    async fn send_ticket(&self, id: &JobId, doc: &TicketDocument) -> Result<()> {
        let frame = OutboundFrame::Ticket { id, datos: doc };
        match self.connection.send_frame(&frame).await {
            Ok(()) => {
                self.jobs_sent.fetch_add(1, Ordering::Relaxed);
                info!(job_id = %id, commands = doc.commands.len(), "ticket sent");
                self.emit(SessionEvent::log(LogCategory::Sent, format!("Job: {id}")));
                Ok(())
            }
            Err(e) => {
                warn!(job_id = %id, error = %e, "ticket not sent");
                let failed = self.ledger.lock().mark_failed(id, &e.to_string());
                if let Some(job) = failed {
                    self.emit(SessionEvent::Job(job));
                }
                self.emit(SessionEvent::log(
                    LogCategory::Error,
                    format!("Send failed: {e}"),
                ));
                Err(e)
            }
        }
    }

    async fn send_control(&self, frame: &OutboundFrame<'_>, description: String) -> Result<()> {
        self.ensure_open()?;
        self.connection.send_frame(frame).await?;
        self.emit(SessionEvent::log(LogCategory::Sent, description));
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

fn request_refresh(refresh: Option<&mpsc::Sender<()>>) {
    // A full channel already has a refresh pending.
    if let Some(tx) = refresh {
        let _ = tx.try_send(());
    }
}

/// Forward connection events in order, running frames through the
/// dispatcher.
async fn pump(
    mut incoming: mpsc::UnboundedReceiver<ConnectionEvent>,
    dispatcher: Dispatcher,
    events: mpsc::UnboundedSender<SessionEvent>,
    refresh: Option<mpsc::Sender<()>>,
    endpoint: String,
) {
    let emit = |event: SessionEvent| {
        let _ = events.send(event);
    };

    while let Some(event) = incoming.recv().await {
        match event {
            ConnectionEvent::State(state) => {
                emit(SessionEvent::Connection(state));
                match state {
                    ConnectionState::Connecting => emit(SessionEvent::log(
                        LogCategory::Info,
                        format!("Connecting to {endpoint}..."),
                    )),
                    ConnectionState::Open => {
                        emit(SessionEvent::log(
                            LogCategory::Info,
                            "Connected to the print service",
                        ));
                        emit(SessionEvent::Notify(Notification::new(
                            NoticeLevel::Success,
                            "Connected to the service",
                        )));
                        request_refresh(refresh.as_ref());
                    }
                    ConnectionState::Closed => {
                        emit(SessionEvent::log(
                            LogCategory::Error,
                            "Connection lost. Retrying...",
                        ));
                        emit(SessionEvent::Notify(Notification::new(
                            NoticeLevel::Error,
                            "Connection lost",
                        )));
                    }
                    ConnectionState::Idle | ConnectionState::Reconnecting => {}
                }
            }
            ConnectionEvent::Frame(text) => {
                let out = dispatcher.dispatch(&text);
                if out.refresh_health {
                    request_refresh(refresh.as_ref());
                }
                for event in out.events {
                    emit(event);
                }
            }
        }
    }
}

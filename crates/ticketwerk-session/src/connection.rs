// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Connection manager: owns the single link to the print service.
//
// The manager runs as one task that holds the link exclusively and walks a
// fixed state machine:
//
//   Idle -> Connecting -> Open -> Closed -> Reconnecting -> Connecting -> ...
//
// A failed handshake also lands in Closed.  From Closed the manager waits
// out the reconnect delay once and tries again, forever.  Callers talk to
// the task through a cloneable `ConnectionHandle`; state changes and inbound
// frames come out of a single ordered channel.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use ticketwerk_core::error::{Result, TicketError};
use ticketwerk_core::types::ConnectionState;

use crate::protocol::OutboundFrame;
use crate::transport::{Connector, LinkReader, LinkWriter};

/// Everything the manager reports, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    State(ConnectionState),
    /// One raw inbound text frame.
    Frame(String),
}

enum Request {
    Connect,
    Send {
        text: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Shutdown,
}

/// Cheap, cloneable handle to a running connection manager.
#[derive(Clone)]
pub struct ConnectionHandle {
    requests: mpsc::UnboundedSender<Request>,
    state: watch::Receiver<ConnectionState>,
}

impl ConnectionHandle {
    /// Ask the manager to connect.  A no-op unless the manager is `Idle`.
    pub fn connect(&self) -> Result<()> {
        self.requests
            .send(Request::Connect)
            .map_err(|_| TicketError::SessionClosed)
    }

    /// Send one text frame.
    ///
    /// Fails with `NotConnected` without queueing anything when the link is
    /// not `Open`, including when it drops between this check and the
    /// write.
    pub async fn send(&self, text: String) -> Result<()> {
        if !self.state().is_open() {
            return Err(TicketError::NotConnected);
        }
        let (reply, outcome) = oneshot::channel();
        self.requests
            .send(Request::Send { text, reply })
            .map_err(|_| TicketError::SessionClosed)?;
        outcome.await.map_err(|_| TicketError::SessionClosed)?
    }

    pub async fn send_frame(&self, frame: &OutboundFrame<'_>) -> Result<()> {
        let text = frame.to_json()?;
        debug!(tipo = frame.tipo(), bytes = text.len(), "sending frame");
        self.send(text).await
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Wait until the manager reaches `target`.
    pub async fn wait_for_state(&self, target: ConnectionState) -> Result<()> {
        let mut state = self.state.clone();
        state
            .wait_for(|s| *s == target)
            .await
            .map(|_| ())
            .map_err(|_| TicketError::SessionClosed)
    }

    /// Close the link and stop reconnecting.
    pub fn shutdown(&self) {
        let _ = self.requests.send(Request::Shutdown);
    }
}

/// How an open link came to an end.
enum Ended {
    Lost,
    Shutdown,
}

pub struct ConnectionManager<C: Connector> {
    connector: C,
    reconnect_delay: Duration,
    requests: mpsc::UnboundedReceiver<Request>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    state: watch::Sender<ConnectionState>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Start the manager task in the `Idle` state.
    pub fn spawn(
        connector: C,
        reconnect_delay: Duration,
    ) -> (
        ConnectionHandle,
        mpsc::UnboundedReceiver<ConnectionEvent>,
        JoinHandle<()>,
    ) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        let manager = Self {
            connector,
            reconnect_delay,
            requests: request_rx,
            events: event_tx,
            state: state_tx,
        };
        let task = tokio::spawn(manager.run());

        let handle = ConnectionHandle {
            requests: request_tx,
            state: state_rx,
        };
        (handle, event_rx, task)
    }

    #[instrument(skip_all, fields(delay_ms = self.reconnect_delay.as_millis() as u64))]
    async fn run(mut self) {
        if !self.wait_for_connect().await {
            self.set_state(ConnectionState::Closed);
            return;
        }

        loop {
            self.set_state(ConnectionState::Connecting);
            let Some(attempt) = self.establish().await else {
                break;
            };

            match attempt {
                Ok((mut writer, mut reader)) => {
                    self.set_state(ConnectionState::Open);
                    let ended = self.serve(&mut writer, &mut reader).await;
                    if let Ended::Shutdown = ended {
                        writer.close().await;
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "connection attempt failed"),
            }

            self.set_state(ConnectionState::Closed);
            self.set_state(ConnectionState::Reconnecting);
            if !self.wait_out_delay().await {
                break;
            }
        }

        self.set_state(ConnectionState::Closed);
        info!("connection manager stopped");
    }

    /// Idle until the first `connect()`.  `false` means shut down instead.
    async fn wait_for_connect(&mut self) -> bool {
        loop {
            match self.requests.recv().await {
                Some(Request::Connect) => return true,
                Some(Request::Send { reply, .. }) => reject(reply),
                Some(Request::Shutdown) | None => return false,
            }
        }
    }

    /// Run one handshake.  `None` means shut down while connecting.
    async fn establish(&mut self) -> Option<Result<(C::Writer, C::Reader)>> {
        let attempt = self.connector.connect();
        tokio::pin!(attempt);
        loop {
            tokio::select! {
                result = &mut attempt => return Some(result),
                request = self.requests.recv() => match request {
                    Some(Request::Connect) => debug!("connect ignored: already connecting"),
                    Some(Request::Send { reply, .. }) => reject(reply),
                    Some(Request::Shutdown) | None => return None,
                },
            }
        }
    }

    /// Pump an open link until it drops or we are told to stop.
    async fn serve(&mut self, writer: &mut C::Writer, reader: &mut C::Reader) -> Ended {
        loop {
            tokio::select! {
                frame = reader.next_text() => match frame {
                    Some(Ok(text)) => {
                        let _ = self.events.send(ConnectionEvent::Frame(text));
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "link error");
                        return Ended::Lost;
                    }
                    None => {
                        info!("link closed by peer");
                        return Ended::Lost;
                    }
                },
                request = self.requests.recv() => match request {
                    Some(Request::Send { text, reply }) => {
                        let outcome = writer.send_text(text).await;
                        let failed = outcome.is_err();
                        let _ = reply.send(outcome);
                        if failed {
                            return Ended::Lost;
                        }
                    }
                    Some(Request::Connect) => debug!("connect ignored: already open"),
                    Some(Request::Shutdown) | None => return Ended::Shutdown,
                },
            }
        }
    }

    /// Sleep the reconnect delay.  `false` means shut down while waiting.
    async fn wait_out_delay(&mut self) -> bool {
        let delay = tokio::time::sleep(self.reconnect_delay);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                () = &mut delay => return true,
                request = self.requests.recv() => match request {
                    Some(Request::Connect) => debug!("connect ignored: reconnect scheduled"),
                    Some(Request::Send { reply, .. }) => reject(reply),
                    Some(Request::Shutdown) | None => return false,
                },
            }
        }
    }

    fn set_state(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        if previous == next {
            return;
        }
        info!(from = %previous, to = %next, "connection state");
        let _ = self.events.send(ConnectionEvent::State(next));
    }
}

fn reject(reply: oneshot::Sender<Result<()>>) {
    let _ = reply.send(Err(TicketError::NotConnected));
}

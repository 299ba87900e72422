// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory transport for exercising the connection manager and session
// without sockets.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use ticketwerk_core::error::{Result, TicketError};

use crate::transport::{Connector, LinkReader, LinkWriter};

/// The service side of one in-memory link.
///
/// Dropping it closes the link as seen by the client.
pub struct Remote {
    pub to_client: mpsc::UnboundedSender<String>,
    pub from_client: mpsc::UnboundedReceiver<String>,
}

impl Remote {
    pub fn push(&self, frame: &str) {
        let _ = self.to_client.send(frame.to_string());
    }

    pub async fn next_frame(&mut self) -> Option<String> {
        self.from_client.recv().await
    }
}

/// Knobs shared between a test and its connector.
#[derive(Clone, Default)]
pub struct Control {
    attempts: Arc<AtomicUsize>,
    refuse: Arc<AtomicBool>,
    /// Frames writers may still send; `None` is unlimited.
    send_budget: Arc<Mutex<Option<usize>>>,
}

impl Control {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Let writers send `n` more frames; after that every write fails as if
    /// the peer had gone away.
    pub fn fail_sends_after(&self, n: usize) {
        *self.send_budget.lock().expect("budget lock") = Some(n);
    }

    fn take_send(&self) -> bool {
        let mut budget = self.send_budget.lock().expect("budget lock");
        match budget.as_mut() {
            None => true,
            Some(0) => false,
            Some(left) => {
                *left -= 1;
                true
            }
        }
    }
}

pub struct MemoryConnector {
    control: Control,
    remotes: mpsc::UnboundedSender<Remote>,
}

impl MemoryConnector {
    /// Connector plus the stream of service-side link ends it opens.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Remote>, Control) {
        let (remotes, accepted) = mpsc::unbounded_channel();
        let control = Control::default();
        let connector = Self {
            control: control.clone(),
            remotes,
        };
        (connector, accepted, control)
    }
}

impl Connector for MemoryConnector {
    type Writer = MemoryWriter;
    type Reader = MemoryReader;

    async fn connect(&self) -> Result<(MemoryWriter, MemoryReader)> {
        self.control.attempts.fetch_add(1, Ordering::SeqCst);
        if self.control.refuse.load(Ordering::SeqCst) {
            return Err(TicketError::Transport("connection refused".into()));
        }

        let (to_client, client_rx) = mpsc::unbounded_channel();
        let (client_tx, from_client) = mpsc::unbounded_channel();
        self.remotes
            .send(Remote {
                to_client,
                from_client,
            })
            .map_err(|_| TicketError::Transport("listener gone".into()))?;
        let writer = MemoryWriter {
            tx: client_tx,
            control: self.control.clone(),
        };
        Ok((writer, MemoryReader { rx: client_rx }))
    }
}

pub struct MemoryReader {
    rx: mpsc::UnboundedReceiver<String>,
}

impl LinkReader for MemoryReader {
    async fn next_text(&mut self) -> Option<Result<String>> {
        self.rx.recv().await.map(Ok)
    }
}

pub struct MemoryWriter {
    tx: mpsc::UnboundedSender<String>,
    control: Control,
}

impl LinkWriter for MemoryWriter {
    async fn send_text(&mut self, text: String) -> Result<()> {
        if !self.control.take_send() {
            return Err(TicketError::Transport("write failed".into()));
        }
        self.tx
            .send(text)
            .map_err(|_| TicketError::Transport("peer closed".into()))
    }

    async fn close(&mut self) {}
}

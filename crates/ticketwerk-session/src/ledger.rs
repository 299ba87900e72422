// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory ledger of jobs submitted during this session.
//
// The ledger records every submission and the last lifecycle state the
// service reported for it.  Entries are never removed and nothing is
// persisted: a new session starts with an empty ledger.  Jobs stuck in
// `Pending` or `Acknowledged` stay there; there is no local expiry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, instrument};

use ticketwerk_core::document::TicketDocument;
use ticketwerk_core::types::{Job, JobId, JobStatus};

use crate::protocol::InboundEvent;

/// Generates identifiers that stay unique within a session.
///
/// Identifiers combine the wall-clock millisecond (for readability in the
/// service logs) with a strictly increasing counter, so any number of ids
/// minted within the same millisecond still differ.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next identifier, e.g. `job-1760000000000-7`.
    pub fn next(&self, prefix: &str) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{}-{seq}", Utc::now().timestamp_millis())
    }
}

/// Jobs in submission order, indexed by id.
#[derive(Debug, Default)]
pub struct JobLedger {
    jobs: Vec<Job>,
    index: HashMap<JobId, usize>,
    ids: IdGenerator,
}

impl JobLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new `Pending` job for `doc` and return its id.
    #[instrument(skip_all)]
    pub fn submit(&mut self, doc: &TicketDocument) -> JobId {
        self.record("job", doc)
    }

    /// Record `n` `Pending` jobs for the same document (a burst).
    #[instrument(skip(self, doc))]
    pub fn bulk_submit(&mut self, doc: &TicketDocument, n: usize) -> Vec<JobId> {
        let ids: Vec<JobId> = (0..n).map(|_| self.record("burst", doc)).collect();
        info!(count = ids.len(), "burst recorded");
        ids
    }

    fn record(&mut self, prefix: &str, doc: &TicketDocument) -> JobId {
        let id = JobId(self.ids.next(prefix));
        self.index.insert(id.clone(), self.jobs.len());
        self.jobs.push(Job::new(id.clone(), doc.commands.len()));
        debug!(job_id = %id, "job recorded as pending");
        id
    }

    /// Apply the single transition an inbound event permits.
    ///
    /// `ack` moves `Pending` to `Acknowledged`; `result` moves any
    /// non-terminal job to `Succeeded` or `Failed`.  Every other event kind,
    /// unknown ids and already-terminal jobs are left untouched.  Returns the
    /// updated job when a transition happened.
    pub fn apply_event(&mut self, event: &InboundEvent) -> Option<Job> {
        match event {
            InboundEvent::Ack(ack) => {
                let job = self.get_mut(&ack.id)?;
                if job.status != JobStatus::Pending {
                    debug!(job_id = %ack.id, status = ?job.status, "ack ignored");
                    return None;
                }
                job.status = JobStatus::Acknowledged;
                job.last_message = ack.mensaje.clone();
                job.updated_at = Utc::now();
                Some(job.clone())
            }
            InboundEvent::Result(result) => {
                let job = self.get_mut(&result.id)?;
                if job.status.is_terminal() {
                    debug!(job_id = %result.id, status = ?job.status, "duplicate result ignored");
                    return None;
                }
                job.status = if result.is_success() {
                    JobStatus::Succeeded
                } else {
                    JobStatus::Failed
                };
                job.last_message = Some(result.mensaje.clone());
                job.updated_at = Utc::now();
                Some(job.clone())
            }
            _ => None,
        }
    }

    /// Mark a job failed locally because its submission frame never left.
    pub fn mark_failed(&mut self, id: &JobId, reason: &str) -> Option<Job> {
        let job = self.get_mut(id)?;
        if job.status.is_terminal() {
            return None;
        }
        job.status = JobStatus::Failed;
        job.last_message = Some(reason.to_string());
        job.updated_at = Utc::now();
        Some(job.clone())
    }

    pub fn get(&self, id: &JobId) -> Option<&Job> {
        self.index.get(id).map(|&i| &self.jobs[i])
    }

    fn get_mut(&mut self, id: &JobId) -> Option<&mut Job> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.jobs[i]),
            None => {
                debug!(job_id = %id, "event for unknown job ignored");
                None
            }
        }
    }

    /// All jobs, oldest first.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn count(&self, status: JobStatus) -> usize {
        self.jobs.iter().filter(|j| j.status == status).count()
    }
}

/// The ledger shared between the submitting caller and the dispatcher.
///
/// Every mutation takes the lock for the duration of one call, which keeps
/// ledger updates serialized even when the runtime is multi-threaded.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger(Arc<Mutex<JobLedger>>);

impl SharedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the ledger.  A poisoned lock is recovered: ledger updates are
    /// single assignments that cannot leave a job half-written.
    pub fn lock(&self) -> MutexGuard<'_, JobLedger> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

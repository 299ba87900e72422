// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Out-of-band health polling of the print service.
//
// The probe is fire-and-forget: a failed request turns into
// `HealthState::Unreachable` and the next tick simply tries again.  Nothing
// here retries on its own or affects the connection manager.

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, instrument, warn};

use ticketwerk_core::config::{ClientConfig, DEFAULT_HEALTH_POLL_INTERVAL};
use ticketwerk_core::error::{Result, TicketError};
use ticketwerk_core::types::{
    BuildInfo, DEFAULT_QUEUE_CAPACITY, HealthReport, HealthState, QueueSnapshot, WorkerStats,
};

use crate::events::SessionEvent;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

// The service omits fields freely; every field is optional on the wire and
// zero/empty values fall back to the display defaults.

#[derive(Debug, Default, Deserialize)]
struct HealthWire {
    #[serde(default)]
    queue: Option<QueueWire>,
    #[serde(default)]
    worker: Option<WorkerWire>,
    #[serde(default)]
    build: Option<BuildWire>,
    #[serde(default)]
    uptime_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct QueueWire {
    current: Option<u32>,
    capacity: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkerWire {
    running: Option<bool>,
    jobs_processed: Option<u64>,
    jobs_failed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BuildWire {
    env: Option<String>,
    date: Option<String>,
    time: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl HealthWire {
    fn into_report(self) -> HealthReport {
        let queue = self.queue.unwrap_or_default();
        let worker = self.worker.unwrap_or_default();
        let build = self.build.unwrap_or_default();
        let defaults = BuildInfo::default();

        HealthReport {
            queue: QueueSnapshot {
                current: queue.current.unwrap_or(0),
                capacity: queue
                    .capacity
                    .filter(|&c| c > 0)
                    .unwrap_or(DEFAULT_QUEUE_CAPACITY),
            },
            worker: WorkerStats {
                running: worker.running.unwrap_or(false),
                jobs_processed: worker.jobs_processed.unwrap_or(0),
                jobs_failed: worker.jobs_failed.unwrap_or(0),
            },
            build: BuildInfo {
                env: non_empty(build.env).unwrap_or(defaults.env),
                date: non_empty(build.date).unwrap_or(defaults.date),
                time: build.time.unwrap_or(defaults.time),
            },
            uptime_seconds: self.uptime_seconds.unwrap_or(0),
        }
    }
}

/// Parse and normalise a `/health` response body.
pub fn parse_health(body: &str) -> Result<HealthReport> {
    let wire: HealthWire = serde_json::from_str(body)?;
    Ok(wire.into_report())
}

/// HTTP client for the `/health` endpoint.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    client: reqwest::Client,
    url: String,
}

impl HealthProbe {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| TicketError::Health(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.health_url())
    }

    /// Fetch one report.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<HealthReport> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| TicketError::Health(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TicketError::Health(format!("HTTP {status}")));
        }

        let wire: HealthWire = response
            .json()
            .await
            .map_err(|e| TicketError::Health(format!("bad body: {e}")))?;
        Ok(wire.into_report())
    }

    /// Fetch one report, folding any failure into `Unreachable`.
    pub async fn probe(&self) -> HealthState {
        match self.fetch().await {
            Ok(report) => {
                debug!(queue = %report.queue, uptime = report.uptime_seconds, "health ok");
                HealthState::Reachable(report)
            }
            Err(e) => {
                warn!(error = %e, "health probe failed");
                HealthState::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Poll `probe` every `every` and whenever `refresh` fires.
///
/// The first probe runs immediately.  A zero `every` polls at the default
/// interval.  The task ends when the refresh senders or the event receiver
/// go away.
pub fn spawn_poller(
    probe: HealthProbe,
    every: Duration,
    mut refresh: mpsc::Receiver<()>,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> JoinHandle<()> {
    let every = if every.is_zero() {
        warn!(default_ms = DEFAULT_HEALTH_POLL_INTERVAL.as_millis() as u64, "zero health poll interval");
        DEFAULT_HEALTH_POLL_INTERVAL
    } else {
        every
    };
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                request = refresh.recv() => {
                    if request.is_none() {
                        break;
                    }
                    debug!("health refresh requested");
                }
            }
            let state = probe.probe().await;
            if events.send(SessionEvent::Health(state)).is_err() {
                break;
            }
        }
        debug!("health poller stopped");
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP responder answering every request with `status` and
    /// `body`.  Returns the `/health` URL.
    pub(crate) async fn health_server(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            while let Ok((mut tcp, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = tcp.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = tcp.write_all(response.as_bytes()).await;
                let _ = tcp.shutdown().await;
            }
        });
        format!("http://{addr}/health")
    }

    const FULL: &str = r#"{
        "queue": {"current": 4, "capacity": 50},
        "worker": {"running": true, "jobs_processed": 120, "jobs_failed": 3},
        "build": {"env": "prod", "date": "2026-01-10", "time": "12:00"},
        "uptime_seconds": 3725
    }"#;

    #[test]
    fn full_report_parses() {
        let report = parse_health(FULL).expect("parse");
        assert_eq!(report.queue, QueueSnapshot { current: 4, capacity: 50 });
        assert!(report.worker.running);
        assert_eq!(report.worker.jobs_failed, 3);
        assert_eq!(report.build.env, "prod");
        assert_eq!(report.uptime_seconds, 3725);
    }

    #[test]
    fn missing_and_zero_fields_fall_back() {
        let report = parse_health(r#"{"queue":{"capacity":0},"build":{"env":""}}"#).expect("parse");
        assert_eq!(report.queue, QueueSnapshot { current: 0, capacity: 100 });
        assert!(!report.worker.running);
        assert_eq!(report.build.env, "unknown");
        assert_eq!(report.build.date, "--");
        assert_eq!(report.uptime_seconds, 0);

        assert_eq!(parse_health("{}").expect("parse"), HealthReport::default());
    }

    #[test]
    fn non_json_body_is_an_error() {
        assert!(parse_health("<html>").is_err());
    }

    #[tokio::test]
    async fn probe_reads_live_endpoint() {
        let url = health_server("200 OK", FULL).await;
        let probe = HealthProbe::new(url).expect("client");
        match probe.probe().await {
            HealthState::Reachable(report) => assert_eq!(report.queue.current, 4),
            other => panic!("expected reachable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_unreachable() {
        let url = health_server("500 Internal Server Error", "{}").await;
        let probe = HealthProbe::new(url).expect("client");
        assert!(matches!(probe.probe().await, HealthState::Unreachable { .. }));
    }

    #[tokio::test]
    async fn dead_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let probe = HealthProbe::new(format!("http://{addr}/health")).expect("client");
        assert!(matches!(probe.probe().await, HealthState::Unreachable { .. }));
    }

    #[tokio::test]
    async fn poller_probes_immediately_and_on_refresh() {
        let url = health_server("200 OK", FULL).await;
        let probe = HealthProbe::new(url).expect("client");
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let (events_tx, mut events) = mpsc::unbounded_channel();

        let task = spawn_poller(probe, Duration::from_secs(3600), refresh_rx, events_tx);
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Health(HealthState::Reachable(_)))
        ));

        refresh_tx.send(()).await.expect("refresh");
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Health(HealthState::Reachable(_)))
        ));

        drop(refresh_tx);
        task.await.expect("poller stops");
    }

    #[tokio::test]
    async fn zero_interval_poller_keeps_running() {
        let url = health_server("200 OK", FULL).await;
        let probe = HealthProbe::new(url).expect("client");
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let (events_tx, mut events) = mpsc::unbounded_channel();

        let task = spawn_poller(probe, Duration::ZERO, refresh_rx, events_tx);
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Health(HealthState::Reachable(_)))
        ));
        assert!(!task.is_finished());

        drop(refresh_tx);
        task.await.expect("poller stops cleanly");
    }
}

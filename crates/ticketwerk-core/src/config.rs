// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TicketError};

/// Default port of the ticket print service.
pub const DEFAULT_PORT: u16 = 8766;

pub const DEFAULT_HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Session settings, persisted as JSON by the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host running the print service.
    pub host: String,
    /// Port serving both `/ws` and `/health`.
    pub port: u16,
    /// Fixed delay between a disconnect and the next connection attempt.
    pub reconnect_delay_ms: u64,
    /// Interval between background health probes.
    pub health_poll_interval_ms: u64,
    /// Opaque token presented when the connection is established.
    pub auth_token: Option<String>,
    /// Number of jobs a burst submits.
    pub burst_size: usize,
    /// Activity-log lines the console retains.
    pub max_log_entries: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: DEFAULT_PORT,
            reconnect_delay_ms: 3000,
            health_poll_interval_ms: DEFAULT_HEALTH_POLL_INTERVAL.as_millis() as u64,
            auth_token: None,
            burst_size: 10,
            max_log_entries: 200,
        }
    }
}

impl ClientConfig {
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}/ws", self.host, self.port)
    }

    pub fn health_url(&self) -> String {
        format!("http://{}:{}/health", self.host, self.port)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Poll interval; `0` is not a usable period and means the default.
    pub fn health_poll_interval(&self) -> Duration {
        match self.health_poll_interval_ms {
            0 => DEFAULT_HEALTH_POLL_INTERVAL,
            ms => Duration::from_millis(ms),
        }
    }

    /// Apply `TICKETWERK_HOST`, `TICKETWERK_PORT` and `TICKETWERK_TOKEN`
    /// overrides from a variable lookup.
    ///
    /// Takes the lookup as a closure so callers (and tests) decide where the
    /// variables come from.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("TICKETWERK_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("TICKETWERK_PORT") {
            self.port = port
                .parse()
                .map_err(|_| TicketError::Config(format!("invalid TICKETWERK_PORT: {port}")))?;
        }
        if let Some(token) = lookup("TICKETWERK_TOKEN") {
            self.auth_token = (!token.is_empty()).then_some(token);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_endpoints() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.ws_url(), "ws://localhost:8766/ws");
        assert_eq!(cfg.health_url(), "http://localhost:8766/health");
        assert_eq!(cfg.reconnect_delay(), Duration::from_millis(3000));
        assert_eq!(cfg.health_poll_interval(), Duration::from_millis(2000));
    }

    #[test]
    fn zero_poll_interval_means_default() {
        let cfg: ClientConfig =
            serde_json::from_str(r#"{"health_poll_interval_ms": 0}"#).expect("parse");
        assert_eq!(cfg.health_poll_interval(), DEFAULT_HEALTH_POLL_INTERVAL);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: ClientConfig =
            serde_json::from_str(r#"{"host": "10.0.0.5"}"#).expect("parse");
        assert_eq!(cfg.host, "10.0.0.5");
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.burst_size, 10);
    }

    #[test]
    fn overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("TICKETWERK_HOST", "pos-01"),
            ("TICKETWERK_PORT", "9000"),
            ("TICKETWERK_TOKEN", "s3cret"),
        ]
        .into_iter()
        .collect();

        let mut cfg = ClientConfig::default();
        cfg.apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .expect("overrides");
        assert_eq!(cfg.ws_url(), "ws://pos-01:9000/ws");
        assert_eq!(cfg.auth_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut cfg = ClientConfig::default();
        let err = cfg
            .apply_overrides(|k| (k == "TICKETWERK_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, TicketError::Config(_)));
        assert_eq!(cfg.port, DEFAULT_PORT);
    }
}

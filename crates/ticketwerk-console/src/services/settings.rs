// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loading and persisting the console's `ClientConfig`.

use std::path::Path;

use tracing::{info, warn};

use ticketwerk_core::config::ClientConfig;
use ticketwerk_core::error::Result;

pub const CONFIG_FILE: &str = "config.json";

/// Read `config.json` from `dir`.  `None` when missing or unreadable.
pub fn load_config(dir: &Path) -> Option<ClientConfig> {
    let path = dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

pub fn persist_config(dir: &Path, config: &ClientConfig) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(dir.join(CONFIG_FILE), json)?;
    Ok(())
}

/// File, then environment overrides, then defaults for anything that failed.
pub fn resolve_config<F>(dir: &Path, lookup: F) -> ClientConfig
where
    F: Fn(&str) -> Option<String>,
{
    let base = load_config(dir).unwrap_or_default();
    let mut config = base.clone();
    if let Err(e) = config.apply_overrides(lookup) {
        warn!(error = %e, "ignoring environment overrides");
        config = base;
    }
    info!(endpoint = %config.ws_url(), auth = config.auth_token.is_some(), "configuration resolved");
    config
}

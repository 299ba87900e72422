// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::PathBuf;

/// The console's data directory, e.g. `~/.local/share/ticketwerk`.
///
/// Not created here; writers create it on demand.
pub fn data_dir() -> PathBuf {
    resolve(|key| std::env::var(key).ok())
}

/// Resolve against an arbitrary variable lookup: `XDG_DATA_HOME`, then
/// `HOME/.local/share`, then `/tmp`.
pub fn resolve<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let base = lookup("XDG_DATA_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            lookup("HOME")
                .filter(|v| !v.is_empty())
                .map(|home| PathBuf::from(home).join(".local").join("share"))
        })
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    base.join("ticketwerk")
}

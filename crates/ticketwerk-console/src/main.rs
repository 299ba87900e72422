// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ticketwerk: operator console for the ticket print service
//
// Entry point. Initialises logging, resolves configuration, opens the
// session, and hands stdin to the console loop.

// The built-in templates are large `json!` literals.
#![recursion_limit = "256"]

mod activity_log;
mod repl;
mod services;
mod state;
mod templates;

use ticketwerk_session::Session;

use repl::{Console, render_error};
use services::{data_dir, settings};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Ticketwerk console starting");

    let dir = data_dir::data_dir();
    let config = settings::resolve_config(&dir, |key| std::env::var(key).ok());

    let (session, events) = match Session::open_ws(config) {
        Ok(opened) => opened,
        Err(e) => {
            tracing::error!(error = %e, "could not start session");
            eprintln!("{}", render_error(&e));
            std::process::exit(1);
        }
    };

    Console::new(session, dir).run(events).await;
}

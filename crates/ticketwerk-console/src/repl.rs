// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line-oriented operator console.
//
// Reads commands from stdin while printing session events as they arrive.
// Every command is a thin call into the session; failures are rendered with
// `humanize_error` and never end the console.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use ticketwerk_core::document::TicketDocument;
use ticketwerk_core::error::{Result, TicketError};
use ticketwerk_core::human_errors::humanize_error;
use ticketwerk_core::types::LogCategory;
use ticketwerk_core::validate::validate;
use ticketwerk_session::{Session, SessionEvent};

use crate::services::settings::persist_config;
use crate::state::ConsoleState;
use crate::templates::Template;

const HELP: &str = "\
commands:
  send [template|file.json]     submit one ticket (default: simple)
  burst [n] [template|file]     submit n copies (default: burstable)
  ping | status | printers      service requests
  health                        refresh and show the dashboard
  jobs                          list jobs submitted this session
  templates                     list built-in templates
  show [template|file]          print a document as it would be sent
  log | clear                   show or clear the activity log
  export [path]                 write the activity log to a file
  config [save]                 show or persist the configuration
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Send(Option<String>),
    Burst {
        count: Option<usize>,
        source: Option<String>,
    },
    Ping,
    Status,
    Printers,
    Health,
    Jobs,
    Templates,
    Show(Option<String>),
    Log,
    Clear,
    Export(Option<PathBuf>),
    ShowConfig,
    SaveConfig,
    Help,
    Quit,
}

/// Parse one input line.  `Ok(None)` for blank lines; `Err` carries a
/// usage message.
pub fn parse(line: &str) -> std::result::Result<Option<Action>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();
    let arg = rest.first().map(|s| s.to_string());

    let action = match command.to_ascii_lowercase().as_str() {
        "send" => Action::Send(arg),
        "burst" => match rest.as_slice() {
            [] => Action::Burst { count: None, source: None },
            [first, tail @ ..] => match first.parse::<usize>() {
                Ok(0) => return Err("burst count must be at least 1".into()),
                Ok(n) => Action::Burst {
                    count: Some(n),
                    source: tail.first().map(|s| s.to_string()),
                },
                Err(_) => Action::Burst {
                    count: None,
                    source: Some(first.to_string()),
                },
            },
        },
        "ping" => Action::Ping,
        "status" => Action::Status,
        "printers" => Action::Printers,
        "health" | "refresh" => Action::Health,
        "jobs" => Action::Jobs,
        "templates" => Action::Templates,
        "show" => Action::Show(arg),
        "log" => Action::Log,
        "clear" => Action::Clear,
        "export" => Action::Export(arg.map(PathBuf::from)),
        "config" => match arg.as_deref() {
            None => Action::ShowConfig,
            Some("save") => Action::SaveConfig,
            Some(other) => return Err(format!("unknown config option: {other}")),
        },
        "help" | "?" => Action::Help,
        "quit" | "exit" => Action::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(action))
}

/// Resolve a template name or a path to a document.  Not validated here.
pub fn load_document(source: &str) -> Result<TicketDocument> {
    if let Some(template) = Template::from_name(source) {
        return template.document();
    }
    let text = std::fs::read_to_string(source)?;
    Ok(TicketDocument::from_json(&text)?)
}

pub enum Flow {
    Continue(Vec<String>),
    Quit,
}

pub struct Console {
    session: Session,
    data_dir: PathBuf,
    pub state: ConsoleState,
}

impl Console {
    pub fn new(session: Session, data_dir: PathBuf) -> Self {
        let state = ConsoleState::new(session.config().max_log_entries);
        Self {
            session,
            data_dir,
            state,
        }
    }

    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
        println!("{HELP}");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                Some(event) = events.recv() => {
                    for line in self.state.apply(event) {
                        println!("{line}");
                    }
                }
                input = lines.next_line() => match input {
                    Ok(Some(line)) => match parse(&line) {
                        Ok(Some(action)) => match self.execute(action).await {
                            Ok(Flow::Continue(out)) => out.iter().for_each(|l| println!("{l}")),
                            Ok(Flow::Quit) => break,
                            Err(e) => println!("{}", render_error(&e)),
                        },
                        Ok(None) => {}
                        Err(usage) => println!("{usage}"),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, "stdin read failed");
                        break;
                    }
                },
            }
        }

        info!("console exiting");
        self.session.shutdown().await;
    }

    pub async fn execute(&mut self, action: Action) -> Result<Flow> {
        let mut out = Vec::new();
        match action {
            Action::Send(source) => {
                let doc = load_document(source.as_deref().unwrap_or("simple"))?;
                let id = self.session.submit(&doc).await?;
                out.push(format!("submitted {id} ({} commands)", doc.commands.len()));
            }
            Action::Burst { count, source } => {
                let n = count.unwrap_or(self.session.config().burst_size);
                let doc = self.burst_document(source.as_deref())?;
                let report = self.session.burst(&doc, n).await?;
                out.push(format!("burst: {} sent, {} failed", report.sent, report.failed));
            }
            Action::Ping => {
                let id = self.session.ping().await?;
                out.push(format!("ping {id} sent"));
            }
            Action::Status => self.session.request_status().await?,
            Action::Printers => self.session.request_printers().await?,
            Action::Health => {
                if let Some(state) = self.session.check_health().await {
                    out.extend(self.state.apply(SessionEvent::Health(state)));
                }
                out.extend(self.state.summary());
            }
            Action::Jobs => {
                let jobs = self.session.jobs();
                if jobs.is_empty() {
                    out.push("no jobs yet".into());
                }
                for job in jobs {
                    out.push(format!(
                        "{}  {:<12} {}  {}",
                        job.submitted_at.format("%H:%M:%S"),
                        format!("{:?}", job.status),
                        job.id,
                        job.last_message.unwrap_or_default()
                    ));
                }
                let counts = self.session.job_counts();
                out.push(format!(
                    "{} pending, {} acknowledged, {} succeeded, {} failed; {} ticket frames sent",
                    counts.pending,
                    counts.acknowledged,
                    counts.succeeded,
                    counts.failed,
                    self.session.jobs_sent()
                ));
            }
            Action::Templates => {
                out.extend(Template::ALL.iter().map(|t| format!("  {}", t.name())));
            }
            Action::Show(source) => {
                let doc = load_document(source.as_deref().unwrap_or("simple"))?;
                out.push(doc.to_pretty_json()?);
            }
            Action::Log => {
                if self.state.log.is_empty() {
                    out.push("activity log is empty".into());
                }
                out.extend(self.state.log.iter().map(ToString::to_string));
                out.push(format!(
                    "{} entries shown, {} logged",
                    self.state.log.len(),
                    self.state.log.total()
                ));
            }
            Action::Clear => {
                self.state.log.clear();
                out.push("activity log cleared".into());
            }
            Action::Export(path) => {
                let path = path.unwrap_or_else(|| self.default_export_path());
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                let lines = self.state.log.export(&path)?;
                out.push(format!("exported {lines} lines to {}", path.display()));
            }
            Action::ShowConfig => {
                let mut shown = self.session.config().clone();
                if shown.auth_token.is_some() {
                    shown.auth_token = Some("********".into());
                }
                out.push(serde_json::to_string_pretty(&shown)?);
                out.push(format!("session {}", self.session.id()));
            }
            Action::SaveConfig => {
                persist_config(&self.data_dir, self.session.config())?;
                out.push(format!("saved to {}", self.data_dir.display()));
            }
            Action::Help => out.push(HELP.into()),
            Action::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue(out))
    }

    /// Burst document: the named source when it loads and validates,
    /// otherwise the burstable template.
    fn burst_document(&mut self, source: Option<&str>) -> Result<TicketDocument> {
        if let Some(source) = source {
            let loaded = load_document(source).and_then(|doc| {
                validate(&doc)?;
                Ok(doc)
            });
            match loaded {
                Ok(doc) => return Ok(doc),
                Err(e) => {
                    warn!(source, error = %e, "burst document unusable");
                    self.state.log.push(
                        LogCategory::Error,
                        format!("Invalid document ({e}); using burstable template"),
                    );
                }
            }
        } else {
            self.state.log.push(LogCategory::Info, "Using burstable template");
        }
        Template::Burstable.document()
    }

    fn default_export_path(&self) -> PathBuf {
        export_path_in(&self.data_dir, chrono::Utc::now().timestamp_millis())
    }
}

fn export_path_in(dir: &Path, millis: i64) -> PathBuf {
    dir.join(format!("ticketwerk-{millis}.log"))
}

pub fn render_error(err: &TicketError) -> String {
    format!("  {}", humanize_error(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketwerk_core::error::ValidationError;
    use ticketwerk_core::config::ClientConfig;
    use ticketwerk_session::WsConnector;

    /// A console whose session never connects.
    fn offline_console(dir: &Path) -> Console {
        let config = ClientConfig::default();
        let connector = WsConnector::new("ws://127.0.0.1:9/ws", None);
        let (session, _events) = Session::start(config, connector, None);
        Console::new(session, dir.to_path_buf())
    }

    #[test]
    fn parses_commands_and_arguments() {
        assert_eq!(parse("   "), Ok(None));
        assert_eq!(parse("send"), Ok(Some(Action::Send(None))));
        assert_eq!(
            parse("send receipt"),
            Ok(Some(Action::Send(Some("receipt".into()))))
        );
        assert_eq!(
            parse("burst 5 raw"),
            Ok(Some(Action::Burst { count: Some(5), source: Some("raw".into()) }))
        );
        assert_eq!(
            parse("BURST ticket.json"),
            Ok(Some(Action::Burst { count: None, source: Some("ticket.json".into()) }))
        );
        assert_eq!(parse("config save"), Ok(Some(Action::SaveConfig)));
        assert_eq!(parse("show"), Ok(Some(Action::Show(None))));
        assert_eq!(
            parse("show receipt"),
            Ok(Some(Action::Show(Some("receipt".into()))))
        );
        assert_eq!(parse("exit"), Ok(Some(Action::Quit)));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse("burst 0").is_err());
        assert!(parse("config reset").is_err());
        assert!(parse("print").is_err());
    }

    #[test]
    fn loads_templates_and_files() {
        assert_eq!(load_document("burstable").expect("template").commands.len(), 1);

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ticket.json");
        std::fs::write(
            &path,
            r#"{"version":"1.0","profile":{"model":"58mm PT-210","paper_width":58},
                "commands":[{"type":"feed","data":{"lines":2}}]}"#,
        )
        .expect("write");
        let doc = load_document(path.to_str().expect("utf-8 path")).expect("file");
        assert_eq!(doc.profile.model, "58mm PT-210");

        assert!(matches!(
            load_document(dir.path().join("missing.json").to_str().expect("path")),
            Err(TicketError::Io(_))
        ));
    }

    #[test]
    fn export_path_is_timestamped() {
        assert_eq!(
            export_path_in(Path::new("/data/ticketwerk"), 42),
            PathBuf::from("/data/ticketwerk/ticketwerk-42.log")
        );
    }

    #[tokio::test]
    async fn send_while_offline_is_a_rendered_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut console = offline_console(dir.path());
        let err = match console.execute(Action::Send(None)).await {
            Err(e) => e,
            Ok(_) => panic!("send must fail while offline"),
        };
        assert!(matches!(err, TicketError::NotConnected));
        assert!(render_error(&err).contains("Not connected"));
    }

    #[tokio::test]
    async fn invalid_file_is_rejected_before_any_io() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"profile":{"model":"x"},"commands":[]}"#).expect("write");

        let mut console = offline_console(dir.path());
        let err = match console
            .execute(Action::Send(Some(path.display().to_string())))
            .await
        {
            Err(e) => e,
            Ok(_) => panic!("invalid document must be rejected"),
        };
        assert!(matches!(
            err,
            TicketError::Validation(ValidationError::MissingVersion)
        ));
    }

    #[tokio::test]
    async fn log_clear_and_export() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut console = offline_console(dir.path());
        console.state.log.push(LogCategory::Info, "hello");

        let target = dir.path().join("out").join("activity.log");
        match console.execute(Action::Export(Some(target.clone()))).await {
            Ok(Flow::Continue(lines)) => assert!(lines[0].starts_with("exported 1 lines")),
            _ => panic!("export failed"),
        }
        assert!(std::fs::read_to_string(&target).expect("read").ends_with("INFO: hello"));

        assert!(console.execute(Action::Clear).await.is_ok());
        assert!(console.state.log.is_empty());
    }

    #[tokio::test]
    async fn config_save_writes_the_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data = dir.path().join("ticketwerk");
        let mut console = offline_console(&data);
        assert!(console.execute(Action::SaveConfig).await.is_ok());
        assert!(data.join(crate::services::settings::CONFIG_FILE).exists());
    }

    #[tokio::test]
    async fn invalid_burst_source_falls_back_to_the_template() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"version":"1.0","profile":{"model":"x"},"commands":[]}"#)
            .expect("write");
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{not json").expect("write");
        let burstable = Template::Burstable.document().expect("template");

        let mut console = offline_console(dir.path());

        for source in [&path, &broken] {
            let doc = console
                .burst_document(Some(source.to_str().expect("utf-8 path")))
                .expect("fallback");
            assert_eq!(doc.commands, burstable.commands);
        }
        assert_eq!(console.state.log.len(), 2);
        assert!(
            console
                .state
                .log
                .iter()
                .all(|entry| entry.to_string().contains("using burstable template"))
        );

        let receipt = console.burst_document(Some("receipt")).expect("template");
        assert_ne!(receipt.commands, burstable.commands);
    }

    #[tokio::test]
    async fn show_prints_the_document_as_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut console = offline_console(dir.path());
        let lines = match console.execute(Action::Show(Some("raw".into()))).await {
            Ok(Flow::Continue(lines)) => lines,
            _ => panic!("show failed"),
        };
        let shown: serde_json::Value = serde_json::from_str(&lines[0]).expect("json");
        assert_eq!(shown["version"], "1.0");
        assert!(shown["commands"].is_array());
    }

    #[tokio::test]
    async fn health_while_unmonitored_still_prints_the_dashboard() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut console = offline_console(dir.path());
        let lines = match console.execute(Action::Health).await {
            Ok(Flow::Continue(lines)) => lines,
            _ => panic!("health failed"),
        };
        assert_eq!(lines, console.state.summary());
    }

    #[tokio::test]
    async fn jobs_lists_counts_per_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut console = offline_console(dir.path());
        let lines = match console.execute(Action::Jobs).await {
            Ok(Flow::Continue(lines)) => lines,
            _ => panic!("jobs failed"),
        };
        assert_eq!(lines[0], "no jobs yet");
        assert!(lines[1].starts_with("0 pending, 0 acknowledged, 0 succeeded, 0 failed"));
    }
}

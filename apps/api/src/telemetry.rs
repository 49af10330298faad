//! Tracing setup. The server logs to stdout, to `{LOG_DIR}/app.log`, and to
//! one file per component (`upload.log`, `llm.log`, `access.log`, ...). All of
//! them are active files the log lifecycle rotates.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const ACTIVE_LOG_FILE: &str = "app.log";
pub const ERROR_LOG_FILE: &str = "errors.log";

/// Component log files and the module paths (under this crate) feeding them.
const COMPONENT_LOGS: &[(&str, &[&str])] = &[
    ("upload.log", &["ingest", "ui"]),
    ("parsing.log", &["parsing", "extract"]),
    ("llm.log", &["llm_client"]),
    ("database.log", &["db", "ingest::persist", "candidates::queries"]),
    ("s3.log", &["storage", "log_lifecycle::remote"]),
];

/// HTTP request/response events from `TraceLayer`.
pub const ACCESS_LOG_FILE: &str = "access.log";

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={level},tower_http={level}",
            env!("CARGO_CRATE_NAME")
        ))
    })
}

/// Opens the file in append mode for every event, so a rotation that
/// renames the file and creates a fresh one is followed without restart.
#[derive(Debug, Clone)]
pub struct ReopeningFile {
    path: PathBuf,
}

impl ReopeningFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl<'a> MakeWriter<'a> for ReopeningFile {
    type Writer = Box<dyn io::Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(file) => Box::new(file),
            Err(_) => Box::new(io::sink()),
        }
    }
}

fn file_layer<S, F>(path: PathBuf, filter: F) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    F: tracing_subscriber::layer::Filter<S> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(ReopeningFile::new(path))
        .with_filter(filter)
        .boxed()
}

/// `app.log` with everything, `errors.log` with errors from any target, and
/// one file per entry in [`COMPONENT_LOGS`] plus `access.log`.
pub fn file_layers<S>(log_dir: &Path) -> Vec<Box<dyn Layer<S> + Send + Sync>>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let crate_name = env!("CARGO_CRATE_NAME");
    let mut layers = vec![
        file_layer(log_dir.join(ACTIVE_LOG_FILE), LevelFilter::TRACE),
        file_layer(log_dir.join(ERROR_LOG_FILE), LevelFilter::ERROR),
        file_layer(
            log_dir.join(ACCESS_LOG_FILE),
            Targets::new().with_target("tower_http", LevelFilter::TRACE),
        ),
    ];
    for (file, modules) in COMPONENT_LOGS {
        let targets = modules.iter().fold(Targets::new(), |targets, module| {
            targets.with_target(format!("{crate_name}::{module}"), LevelFilter::TRACE)
        });
        layers.push(file_layer(log_dir.join(file), targets));
    }
    layers
}

/// Stdout plus the active and component log files under `log_dir`.
pub fn init_server(rust_log: &str, log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    tracing_subscriber::registry()
        .with(env_filter(rust_log))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layers(log_dir))
        .try_init()?;
    Ok(())
}

/// Stdout only, for one-shot subcommands.
pub fn init_cli(rust_log: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(rust_log))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_writer_follows_rotation() {
        let tmp = tempfile::tempdir().unwrap();
        let active = tmp.path().join(ACTIVE_LOG_FILE);
        let sink = ReopeningFile::new(&active);

        sink.make_writer().write_all(b"before\n").unwrap();
        fs::rename(&active, tmp.path().join("app.20250101_000000.log")).unwrap();
        sink.make_writer().write_all(b"after\n").unwrap();

        assert_eq!(fs::read_to_string(&active).unwrap(), "after\n");
        assert_eq!(
            fs::read_to_string(tmp.path().join("app.20250101_000000.log")).unwrap(),
            "before\n"
        );
    }

    #[test]
    fn test_component_events_land_in_their_own_files() {
        let tmp = tempfile::tempdir().unwrap();
        let subscriber = tracing_subscriber::registry().with(file_layers(tmp.path()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(
                target: concat!(env!("CARGO_CRATE_NAME"), "::llm_client"),
                "completion requested"
            );
            tracing::info!(
                target: concat!(env!("CARGO_CRATE_NAME"), "::ingest::pipeline"),
                "resume stored"
            );
            tracing::error!(
                target: concat!(env!("CARGO_CRATE_NAME"), "::ingest::persist"),
                "insert failed"
            );
            tracing::info!(target: "tower_http::trace::on_response", "finished processing request");
        });

        let read = |name: &str| fs::read_to_string(tmp.path().join(name)).unwrap_or_default();

        assert!(read("llm.log").contains("completion requested"));
        assert!(!read("llm.log").contains("resume stored"));
        assert!(read("upload.log").contains("resume stored"));
        assert!(read("upload.log").contains("insert failed"));
        assert!(read("database.log").contains("insert failed"));
        assert!(!read("database.log").contains("resume stored"));
        assert!(read(ERROR_LOG_FILE).contains("insert failed"));
        assert!(!read(ERROR_LOG_FILE).contains("completion requested"));
        assert!(read(ACCESS_LOG_FILE).contains("finished processing request"));
        assert!(!read(ACCESS_LOG_FILE).contains("resume stored"));

        let everything = read(ACTIVE_LOG_FILE);
        for message in ["completion requested", "resume stored", "insert failed"] {
            assert!(everything.contains(message));
        }
    }

    #[test]
    fn test_unwritable_path_falls_back_to_sink() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = ReopeningFile::new(tmp.path().join("missing").join("app.log"));
        sink.make_writer().write_all(b"dropped").unwrap();
    }
}

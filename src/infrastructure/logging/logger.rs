use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use super::formatter::SanitizingFormatter;
use super::redaction::{sanitize_error_message, sanitize_line};
use super::remote::RemoteSinkLayer;
use super::rotation::RetentionPolicy;
use super::scheduler::RetentionScheduler;
use super::writer::TimedRotatingWriter;
use crate::domain::models::{Config, RetentionConfig};
use crate::infrastructure::sinks::HttpRecordSink;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Live logging pipeline.
///
/// Keeps the file writer's worker alive and owns the retention scheduler.
/// Hold it for the lifetime of the application and call
/// [`shutdown`](Self::shutdown) before exiting.
#[derive(Debug)]
pub struct LoggingHandle {
    _guard: Option<WorkerGuard>,
    scheduler: Option<RetentionScheduler>,
}

impl LoggingHandle {
    pub const fn scheduler(&self) -> Option<&RetentionScheduler> {
        self.scheduler.as_ref()
    }

    /// Stop the retention scheduler and flush the file writer.
    pub async fn shutdown(mut self) {
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.stop().await;
        }
    }
}

/// Logger implementation using tracing
pub struct LoggerImpl;

/// Setup problems collected before the subscriber exists and reported once
/// it is installed.
#[derive(Default)]
struct SetupNotes {
    errors: Vec<String>,
    infos: Vec<String>,
}

impl LoggerImpl {
    /// Install the full pipeline: console, rotating file, optional remote
    /// sink, an initial retention sweep and the daily scheduler.
    ///
    /// File and remote sink failures degrade the pipeline instead of failing
    /// it; they are logged (redacted) once the subscriber is installed.
    ///
    /// # Errors
    /// Returns an error if the level is invalid or a global subscriber is
    /// already installed
    pub fn init(config: &Config) -> Result<LoggingHandle> {
        let level = parse_log_level(&config.logging.level)?;
        let known_uris: Arc<[String]> = config.remote.uri.iter().cloned().collect();
        let mut notes = SetupNotes::default();
        let mut layers: Vec<BoxedLayer> = Vec::new();

        if config.logging.enable_stdout {
            layers.push(console_layer(&config.logging.format, level, &known_uris));
        }

        let retention = config.logging.retention();
        let policy = RetentionPolicy::from_config(&retention);

        let writer = TimedRotatingWriter::new(
            config.logging.directory.clone(),
            config.logging.file_name.clone(),
        );
        let guard = match writer {
            Ok(writer) => {
                let (non_blocking, guard) =
                    tracing_appender::non_blocking(writer.with_retention(policy.clone()));
                layers.push(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .event_format(
                            SanitizingFormatter::new(
                                tracing_subscriber::fmt::format()
                                    .json()
                                    .with_current_span(true)
                                    .with_span_list(true)
                                    .with_target(true)
                                    .with_thread_ids(true)
                                    .with_thread_names(true),
                            )
                            .with_known_uris(Arc::clone(&known_uris)),
                        )
                        .with_filter(env_filter(level))
                        .boxed(),
                );
                Some(guard)
            }
            Err(e) => {
                notes.errors.push(format!(
                    "Failed to setup file logging: {}",
                    sanitize_line(&e.to_string())
                ));
                None
            }
        };

        match config.remote.target() {
            Some((uri, database, collection)) => match HttpRecordSink::new(uri, database, collection)
            {
                Ok(sink) => {
                    notes
                        .infos
                        .push(format!("remote logging enabled ({})", sink.endpoint()));
                    layers.push(
                        RemoteSinkLayer::new(Arc::new(sink), Arc::clone(&known_uris))
                            .with_filter(env_filter(level))
                            .boxed(),
                    );
                }
                Err(e) => notes.errors.push(format!(
                    "Failed to setup remote logging: {}",
                    sanitize_error_message(&e.to_string(), &known_uris)
                )),
            },
            None => notes
                .infos
                .push("remote logging disabled - missing configuration".to_string()),
        }

        tracing_subscriber::registry()
            .with(layers)
            .try_init()
            .context("a global tracing subscriber is already installed")?;

        for message in &notes.errors {
            tracing::error!("{message}");
        }
        for message in &notes.infos {
            tracing::info!("{message}");
        }

        let scheduler = start_retention(retention, policy);

        tracing::info!(
            level = %config.logging.level,
            format = %config.logging.format,
            file_output = guard.is_some(),
            directory = %config.logging.directory.display(),
            "logging setup completed"
        );

        Ok(LoggingHandle {
            _guard: guard,
            scheduler: Some(scheduler),
        })
    }

    /// Basic pipeline: console plus a plain (non-rotating) file, both redacted.
    ///
    /// # Errors
    /// Returns an error if a global subscriber is already installed
    pub fn init_basic(config: &Config) -> Result<LoggingHandle> {
        let level = parse_log_level(&config.logging.level).unwrap_or(Level::INFO);
        let known_uris: Arc<[String]> = config.remote.uri.iter().cloned().collect();

        std::fs::create_dir_all(&config.logging.directory)
            .context("failed to create log directory")?;
        let appender =
            tracing_appender::rolling::never(&config.logging.directory, &config.logging.file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        let layers: Vec<BoxedLayer> = vec![
            console_layer("pretty", level, &known_uris),
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .event_format(
                    SanitizingFormatter::new(tracing_subscriber::fmt::format())
                        .with_known_uris(Arc::clone(&known_uris)),
                )
                .with_filter(env_filter(level))
                .boxed(),
        ];

        tracing_subscriber::registry()
            .with(layers)
            .try_init()
            .context("a global tracing subscriber is already installed")?;

        tracing::info!(
            path = %config.logging.active_file().display(),
            "basic file logging enabled"
        );

        Ok(LoggingHandle {
            _guard: Some(guard),
            scheduler: None,
        })
    }

    /// Console only, at `info`.
    ///
    /// # Errors
    /// Returns an error if a global subscriber is already installed
    pub fn init_console() -> Result<LoggingHandle> {
        tracing_subscriber::registry()
            .with(console_layer("pretty", Level::INFO, &Arc::from(Vec::new())))
            .try_init()
            .context("a global tracing subscriber is already installed")?;

        Ok(LoggingHandle {
            _guard: None,
            scheduler: None,
        })
    }

    /// Redacted stderr diagnostics for one-shot commands, honouring
    /// `RUST_LOG` and defaulting to `info`.
    ///
    /// # Errors
    /// Returns an error if a global subscriber is already installed
    pub fn init_diagnostics() -> Result<()> {
        tracing_subscriber::registry()
            .with(diagnostics_layer(io::stderr, &Arc::from(Vec::new())))
            .try_init()
            .context("a global tracing subscriber is already installed")
    }

    /// Try the full pipeline, then basic file logging, then console only.
    ///
    /// Never fails; diagnostics go to stderr because no subscriber may exist
    /// yet when a step fails.
    pub fn init_with_fallback(config: &Config) -> LoggingHandle {
        let known_uris: Vec<&str> = config.remote.uri.iter().map(String::as_str).collect();

        match Self::init(config) {
            Ok(handle) => return handle,
            Err(e) => eprintln!(
                "Advanced logging setup failed: {}. Falling back to basic file logging...",
                sanitize_error_message(&format!("{e:#}"), &known_uris)
            ),
        }

        match Self::init_basic(config) {
            Ok(handle) => return handle,
            Err(e) => eprintln!(
                "File logging also failed: {}. Using console logging only.",
                sanitize_error_message(&format!("{e:#}"), &known_uris)
            ),
        }

        Self::init_console().unwrap_or_else(|e| {
            eprintln!("Console logging unavailable: {e:#}");
            LoggingHandle {
                _guard: None,
                scheduler: None,
            }
        })
    }
}

/// Run the startup sweep and start the daily scheduler.
fn start_retention(retention: RetentionConfig, policy: RetentionPolicy) -> RetentionScheduler {
    policy.sweep(&policy.active_file());

    let mut scheduler = RetentionScheduler::new(retention).with_policy(policy);
    scheduler.start();
    scheduler
}

fn console_layer(format: &str, level: Level, known_uris: &Arc<[String]>) -> BoxedLayer {
    match format {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stdout)
            .with_ansi(false)
            .event_format(
                SanitizingFormatter::new(
                    tracing_subscriber::fmt::format()
                        .json()
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_thread_names(true),
                )
                .with_known_uris(Arc::clone(known_uris)),
            )
            .with_filter(env_filter(level))
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(io::stdout)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .event_format(
                SanitizingFormatter::new(
                    tracing_subscriber::fmt::format()
                        .pretty()
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .with_known_uris(Arc::clone(known_uris)),
            )
            .with_filter(env_filter(level))
            .boxed(),
    }
}

/// Plain text layer writing redacted events to `make_writer`.
pub fn diagnostics_layer<W>(make_writer: W, known_uris: &Arc<[String]>) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_writer(make_writer)
        .with_ansi(false)
        .event_format(
            SanitizingFormatter::new(tracing_subscriber::fmt::format().with_target(true))
                .with_known_uris(Arc::clone(known_uris)),
        )
        .with_filter(env_filter(Level::INFO))
        .boxed()
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

/// Parse log level string to Level
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}

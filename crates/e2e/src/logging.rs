//! Logging setup
//!
//! Two sinks: an append-only run log with one `<timestamp> [<LEVEL>] <message>`
//! line per event, and a compact stderr stream for whoever is watching the run.

use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;

use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{
        format::{DefaultFields, Writer},
        FmtContext, FormatEvent, FormatFields, MakeWriter,
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::error::{E2eError, E2eResult};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// `2024-03-01 14:02:11,503 [INFO] message`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLineFormat;

impl<S, N> FormatEvent<S, N> for LogLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let now = chrono::Local::now();
        write!(writer, "{} [{}] ", now.format(TIMESTAMP_FORMAT), event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// The run-log layer over any writer
pub fn log_line_layer<S, W>(writer: W) -> tracing_subscriber::fmt::Layer<S, DefaultFields, LogLineFormat, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(LogLineFormat)
        .with_writer(writer)
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("catalog_e2e=debug,catalog_webdriver=debug,info")
        } else {
            EnvFilter::new("info")
        }
    })
}

/// Install the global subscriber.
///
/// The returned guard flushes the run log when dropped, so hold it until
/// the process is about to exit.
pub fn init(log_path: &Path, verbose: bool) -> E2eResult<WorkerGuard> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(log_line_layer(writer))
        .with(stderr_layer)
        .try_init()
        .map_err(|e| E2eError::Config(format!("logging already initialised: {}", e)))?;

    Ok(guard)
}

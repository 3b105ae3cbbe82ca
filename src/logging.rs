//! Logger setup: stderr output at the configured level plus an optional
//! DEBUG-level session log file in the user cache directory.

use std::fs;
use std::io;
use std::path::PathBuf;

use time::macros::format_description;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log directory in the user-specific OS cache directory:
/// - Linux: ~/.cache/dws-tools/dws-language-server/
/// - macOS: ~/Library/Caches/dws-tools/dws-language-server/
/// - Windows: %LOCALAPPDATA%\dws-tools\dws-language-server\
fn log_dir() -> io::Result<PathBuf> {
    let cache_dir = dirs::cache_dir().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "unable to determine user cache directory",
        )
    })?;
    let log_dir = cache_dir.join("dws-tools").join("dws-language-server");
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }
    Ok(log_dir)
}

/// Initialize the logger. The returned guard must be kept alive for the
/// duration of the program so buffered file output is flushed on exit.
///
/// Level precedence for stderr: `log_level` argument, then `RUST_LOG`,
/// then "info". The session file always logs at DEBUG.
pub fn init_logger(
    no_color: bool,
    log_level: Option<&str>,
    enable_file_logging: bool,
) -> io::Result<Option<WorkerGuard>> {
    let timer = fmt::time::OffsetTime::new(
        UtcOffset::UTC,
        format_description!(
            "[[[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z]"
        ),
    );

    let stderr_filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(timer.clone())
        .with_ansi(!no_color)
        .with_filter(stderr_filter);

    let (file_layer, guard) = if enable_file_logging {
        let dir = log_dir()?;
        let timestamp = time::OffsetDateTime::now_utc()
            .format(&format_description!(
                "[year][month][day]-[hour][minute][second]"
            ))
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let file = fs::File::create(dir.join(format!("session-{timestamp}.log")))?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_timer(timer)
            .with_ansi(false)
            .with_filter(EnvFilter::new("debug"));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

use std::ffi::OsStr;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

// Keep the returned guards alive until exit or buffered file lines are lost
pub fn init(level: Level, console: bool, log_file: Option<&Path>) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();

    let console_layer = if console {
        let format = fmt::format()
            .with_level(true) // include levels in formatted output
            .with_target(true) // include targets
            .with_thread_ids(false) // don't include the thread ID of the current thread
            .with_thread_names(false) // don't include the name of the current thread
            .compact(); // use the `Compact` formatting style.
        Some(fmt::layer().event_format(format))
    } else {
        None
    };

    let file_layer = log_file.map(|path| {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let name = path.file_name().unwrap_or(OsStr::new("thermoclock.log"));
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
        guards.push(guard);
        fmt::layer().with_writer(writer).with_ansi(false).compact()
    });

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(LevelFilter::from_level(level))
        .init();
    guards
}

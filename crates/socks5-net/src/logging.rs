use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initializes line-oriented structured logging shared by all three
/// daemons (§6: "each daemon writes a line-oriented log to a fixed
/// filename"). Without a log file, logs go to stderr.
pub fn init(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path.file_name().unwrap_or(path.as_os_str());
            let appender = match dir {
                Some(dir) => tracing_appender::rolling::never(dir, file_name),
                None => tracing_appender::rolling::never(".", file_name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            // Leaked intentionally: the guard must outlive the process for
            // buffered log lines to flush, and daemons run for the process
            // lifetime.
            Box::leak(Box::new(guard));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

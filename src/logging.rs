use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

pub const DEFAULT_FILTER: &str = "point_labeler=debug,warn";

/// Keep the returned guard alive until exit, dropping it flushes the file writer.
pub fn init_logs() -> WorkerGuard {
    /// eframe and winit log through `log`
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to install log forwarding: {}", e);
    }

    let file_appender = tracing_appender::rolling::daily("logs", "point_labeler.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_timer(fmt::time::LocalTime::rfc_3339());

    let subscriber = Registry::default()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to init logging: {}", e);
    }

    guard
}

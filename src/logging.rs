use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn setup_tracing(verbosity_level: u8) {
    let filter = match verbosity_level {
        0 => tracing::level_filters::LevelFilter::INFO,
        1 => tracing::level_filters::LevelFilter::INFO,
        2 => tracing::level_filters::LevelFilter::DEBUG,
        3 => tracing::level_filters::LevelFilter::TRACE,
        _ => tracing::level_filters::LevelFilter::TRACE,
    };

    // stdout is reserved for events printed by the listen command
    let stderr_writer = fmt::Layer::default()
        .with_thread_names(true)
        .with_writer(std::io::stderr);

    let env_filter = EnvFilter::builder()
        .with_default_directive(filter.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_writer)
        .init();
}

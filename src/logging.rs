use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive, e.g. `dreitagebart=debug`.
pub const LOG_ENV: &str = "DREITAGEBART_LOG";

/// Installs the stderr subscriber. Log lines stay off stdout so they never
/// interleave with spinners and prompts.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(filter(std::env::var(LOG_ENV).ok().as_deref(), verbose))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}

fn filter(directive: Option<&str>, verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "warn" };
    directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

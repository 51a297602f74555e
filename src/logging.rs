//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing output on stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbose` switches between `info` and
/// `debug` for this crate. sqlx statement logging stays at `warn`.
pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "pokerbank=debug,tower_http=debug,sqlx=warn"
    } else {
        "pokerbank=info,sqlx=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(verbose)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

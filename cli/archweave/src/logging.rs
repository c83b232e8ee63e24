//! Log output setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `ARCHWEAVE_LOG` overrides the default filter. Logs go to stderr so that
/// report output on stdout stays machine-readable.
pub fn init(verbose: bool) {
    let default = if verbose {
        "archweave=debug"
    } else {
        "archweave=info"
    };
    let filter = EnvFilter::try_from_env("ARCHWEAVE_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .compact(),
        )
        .init();
}

//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence; otherwise the filter follows the
//! configured [`Verbosity`]. Output goes to stderr so stdout only carries
//! answers.

use tracing_subscriber::EnvFilter;

use crate::agent::mode::Verbosity;

/// Builds the filter for `verbosity`, honouring `RUST_LOG` when set.
#[must_use]
pub fn filter_for(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()))
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

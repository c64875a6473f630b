//! Tracing setup for the Penny arm binaries.
//!
//! Logs go to stderr so they never interleave with console output on stdout.

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
///
/// Serial traffic is logged at debug, so `verbose` shows every line sent.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install a compact stderr subscriber for the lifetime of the returned guard.
///
/// `RUST_LOG` wins over `verbose` when set.
///
/// # Example
/// ```no_run
/// use penny_arm_lib::init_tracing;
///
/// fn main() {
///     let _guard = init_tracing(false);
///     // Controller code here
/// }
/// ```
pub fn init_tracing(verbose: bool) -> DefaultGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_default(subscriber)
}

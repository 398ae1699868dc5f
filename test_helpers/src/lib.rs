//! Test-only helpers shared across the workspace's `#[cfg(test)]` modules.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]

#[cfg(feature = "future_timeout")]
mod timeout;
#[cfg(feature = "future_timeout")]
pub use timeout::*;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Install a best-effort `tracing` subscriber for test output, controlled by
/// `RUST_LOG`. Safe to call from every test; only the first call takes effect.
pub fn maybe_start_logging() {
    INIT_TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Assert `result` is `Err` and that its `Display` contains `expected`.
#[macro_export]
macro_rules! assert_error {
    ($result:expr, $expected:expr) => {
        match $result {
            Ok(_) => panic!("expected an error containing {:?}, got Ok", $expected),
            Err(e) => {
                let msg = e.to_string();
                assert!(
                    msg.contains($expected),
                    "error {:?} did not contain {:?}",
                    msg,
                    $expected
                );
            }
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn assert_error_matches_substring() {
        let result: Result<(), String> = Err("no such database: LSST".to_string());
        assert_error!(result, "no such database");
    }
}

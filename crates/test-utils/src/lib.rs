//! Shared helpers for siteflow's integration tests: temp projects,
//! recording registries and a fake watch backend.

pub mod builders;
pub mod fake_backend;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use siteflow::logging::LOG_ENV;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// How long a single test future may take before it counts as hung.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Install a test-friendly subscriber once per test binary.
///
/// Output goes through the test writer, so it only shows for failing
/// tests. The filter comes from `SITEFLOW_LOG` (default `warn`), e.g.
/// `SITEFLOW_LOG=siteflow::engine=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking after [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("test future still pending after {TEST_TIMEOUT:?}"),
    }
}

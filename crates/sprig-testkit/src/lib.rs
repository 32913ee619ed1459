//! Sprig Testing Infrastructure
//!
//! Shared doubles and fixtures for tests that exercise whole applications.
//!
//! # Usage
//!
//! Add this to your crate's `Cargo.toml` dev-dependencies:
//! ```toml
//! [dev-dependencies]
//! sprig-testkit = { path = "../sprig-testkit" }
//! ```
//!
//! Then in your tests:
//! ```rust,no_run
//! use sprig_testkit::*;
//!
//! #[test]
//! fn my_test() {
//!     let app = build_site(event_log(), InMemoryConfigSource::new()).unwrap();
//!     let mut io = MockRequest::local("/counter/hit");
//!     app.serve(&mut io).unwrap();
//! }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod config_source;
pub mod fixtures;
pub mod mock_request;
pub mod strategies;

pub use config_source::InMemoryConfigSource;
pub use fixtures::*;
pub use mock_request::{MockRequest, REMOTE_ADDR};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static TRACING: OnceCell<()> = OnceCell::new();

/// Installs a test-friendly tracing subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `warn`.
pub fn init_test_tracing() {
    TRACING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

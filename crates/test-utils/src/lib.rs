//! Mocks and fixtures for testing the steptract marketplace workflows
//! without a chain or a store.

pub mod chain;
pub mod orders;
pub mod store;
pub mod users;

pub use steptract_constants::test_utils as test_constants;

/// Install a test subscriber that honours `RUST_LOG`. Safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

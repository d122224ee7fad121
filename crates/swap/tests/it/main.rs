mod backends;
mod scenarios;
mod swap;
mod transfer;
pub mod utils;

/// Routes `RUST_LOG` output through the test harness so it shows up only for failing tests.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn main() {}

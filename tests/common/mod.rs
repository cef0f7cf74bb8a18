#![allow(dead_code)]

pub mod synthetic_log;

/// Initialise logging once per test binary.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

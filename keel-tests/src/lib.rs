mod batch;
mod configuration;
mod inspection;
mod simple;
mod transaction;

use crate::{
    batch::batch, configuration::configuration, inspection::inspection, simple::simple,
};
use keel::{Provider, Result};
use log::LevelFilter;
use std::env;
#[cfg(not(feature = "disable-transaction-timeout"))]
use transaction::transaction_timeout;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs the whole suite, `connect` must open a new connection to the same database on every call.
pub fn execute_tests<P: Provider>(connect: impl Fn() -> Result<P>) {
    simple(&connect);
    batch(&connect);
    configuration(&connect);
    inspection(&connect);
    #[cfg(not(feature = "disable-transaction-timeout"))]
    transaction_timeout(&connect);
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}

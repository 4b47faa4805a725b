//! A synthetic collection driver that exercises the aggregation engine end to end: concurrent producers record
//! Pareto-distributed latencies against a small instrument registry, and checkpoints are flushed to a console
//! exporter at each interval boundary.

#![deny(warnings)]
#![deny(missing_docs)]

use clap::Parser as _;
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};
use vizsla_error::GenericError;

mod config;
use self::config::Config;

mod driver;
use self::driver::Driver;

mod exporter;

fn main() {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(true)
        .with_target(true)
        .init();

    let config = Config::parse();

    match run(config) {
        Ok(()) => info!("metronome stopped."),
        Err(e) => {
            error!("{:?}", e);
            std::process::exit(1);
        }
    }
}

fn run(config: Config) -> Result<(), GenericError> {
    info!("metronome starting...");

    let driver = Driver::new(config)?;
    driver.run()
}

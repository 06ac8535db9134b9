//! Main application entry point (native).

use std::process::ExitCode;
use tabletop_app::{App, AppConfig};

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting tabletop");

    let config = match AppConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    match App::new(config).run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

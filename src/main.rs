mod app;
mod config;
mod domain;
mod infra;
mod ui;
mod usecase;


use std::fs::File;

use simplelog::{Config, WriteLogger};

use crate::app::App;
use crate::config::AppConfig;

fn main() {
    let config = AppConfig::load().expect("should resolve the application directories");
    config
        .ensure_dirs()
        .expect("should create the application directories");
    init_logging(&config);
    log::info!("starting hrdesk with database {}", config.db_path.display());

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(dioxus::desktop::WindowBuilder::new().with_title("HR Desk"))
                .with_data_directory(config.webview_dir.clone()),
        )
        .launch(App);
}

fn init_logging(config: &AppConfig) {
    let file = match File::create(&config.log_path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("logging disabled, cannot create {}: {err}", config.log_path.display());
            return;
        }
    };
    if let Err(err) = WriteLogger::init(config.log_level, Config::default(), file) {
        eprintln!("logging disabled: {err}");
    }
}

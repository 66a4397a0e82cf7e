use std::fs::File;
use std::process::ExitCode;
use std::sync::Mutex;

use chrono::Local;
use clap::Parser;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use leadtable::controller::Controller;
use leadtable::domain::{Cli, LeadTableError, ViewerConfig};
use leadtable::loader;
use leadtable::model::{Model, Status};
use leadtable::ui::TableUI;

const LOG_ENV: &str = "LEADTABLE_LOG";

fn main() -> ExitCode {
    let config = match ViewerConfig::try_from(Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&config) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let result = run(&config);
    ratatui::restore();
    match result {
        Err(e) => {
            error!("Exiting with {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(config: &ViewerConfig) -> Result<(), LeadTableError> {
    let log_file = File::create(&config.log_file)?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .with_filter(filter),
        )
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| LeadTableError::InvalidConfig(format!("logging: {e}")))
}

fn run(config: &ViewerConfig) -> Result<(), LeadTableError> {
    info!("Starting leadtable with {config:?}");

    let table = loader::load(config)?;
    let mut model = Model::init(config, table, Local::now().fixed_offset());
    let mut ui = TableUI::new();
    let controller = Controller::new(config);

    let mut terminal = ratatui::init();

    while model.status != Status::QUITTING {
        model.tick(Local::now().fixed_offset());
        terminal
            .draw(|f| ui.draw(&model, f))
            .map_err(|e| LeadTableError::Terminal(e.to_string()))?;

        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }

    let stats = model.cache_stats();
    info!("Render cache {stats:?}");
    Ok(())
}

use clap::Parser;
use std::process::ExitCode;
use tracing::{info, Level};

use sqlgate::cli::{self, Args};
use sqlgate::{Config, Database, Result};

fn init_logging(level: Option<&str>) {
    let level = level
        .and_then(|l| l.parse::<Level>().ok())
        .unwrap_or(Level::WARN);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<String> {
    let mut config = Config::resolve(args.config.as_deref())?;
    args.apply_to(&mut config);
    init_logging(args.log_level.as_deref().or(config.log_level()));

    info!(database = %config.database.name, mode = %args.mode, "starting sqlgate");
    let db = Database::install(config.database)?;
    let output = cli::run(db, args)?;
    Ok(serde_json::to_string_pretty(&output)?)
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("sqlgate: {}", e);
            ExitCode::FAILURE
        }
    }
}

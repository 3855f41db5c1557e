use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use gateway_pipeline::commands::{self, ExchangeSpec};
use gateway_pipeline::config;
use gateway_pipeline::error::Result;
use gateway_pipeline::logging;
use gateway_pipeline::script::{RuntimeManager, ScriptRegistry};

#[derive(Parser, Debug)]
#[command(name = "gateway-pipeline")]
#[command(about = "Run requests through a scripted filter pipeline", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (YAML/JSON/TOML)
    #[arg(short, long, value_name = "FILE", global = true, default_value = "gateway.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Push one request through the configured route and print the response
    Run {
        /// Request URI
        uri: String,

        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request header as `name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Validate the configuration and compile every script
    Check,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match config::load_from_path(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            logging::init("info", args.debug, false)?;
            error!("Failed to load configuration from {}: {}", args.config.display(), e);
            return Err(e);
        }
    };
    logging::init_from_config(&config.logging, args.debug)?;
    info!("Configuration loaded from {}", args.config.display());

    let registry = ScriptRegistry::global();
    let result = match args.command {
        Command::Check => commands::run_config_check(&config, registry).map(|_| ()),
        Command::Run {
            uri,
            method,
            headers,
            body,
        } => {
            let spec = ExchangeSpec {
                method,
                uri,
                headers,
                body,
            };
            commands::run_exchange(&config, registry, &spec)
                .map(|response| println!("{}", commands::format_response(&response)))
        }
    };

    RuntimeManager::global().cleanup();
    result
}

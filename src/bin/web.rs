//! Web UI entry point for neurogrid.
//!
//! Run with: cargo run --bin neurogrid-web
//!
//! Then open http://127.0.0.1:8080 in your browser.

use clap::Parser;
use neurogrid::{web::run_server, Config};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "neurogrid-web")]
#[command(about = "neurogrid web server: live simulation over WebSocket plus a small REST API")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Directory with the static front end
    #[arg(long, default_value = "public")]
    static_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config first so its log level can seed the logger
    let (config, source) = load_config(&args.config);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.log_level)).init();
    log::info!("Configuration: {}", source);

    let bind: SocketAddr = args
        .bind
        .parse()
        .map_err(|e| format!("Invalid bind address '{}': {}", args.bind, e))?;

    run_server(config, bind, args.static_dir).await
}

/// Load configuration from file or use default
fn load_config(config_path: &str) -> (Config, String) {
    let paths = [config_path, "config.yaml", "neurogrid.yaml"];
    for path in paths {
        match Config::from_file(path) {
            Ok(config) => return (config, format!("loaded from {}", path)),
            Err(neurogrid::error::ConfigError::Io(_)) => continue,
            Err(e) => eprintln!("Ignoring {}: {}", path, e),
        }
    }
    (Config::default(), "defaults".to_string())
}

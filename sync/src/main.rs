use clap::{Arg, Command};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = Command::new("Trip Sync")
        .version("1.0")
        .about("Publishes monthly MetroBike trip data to the open data portal")
        .subcommand(
            Command::new("sync")
                .about("Run the monthly sync loop")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Sets a custom config file"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("sync", sync_matches)) => {
            let config_path = sync_matches
                .get_one::<String>("config")
                .map(|s| s.as_str())
                .unwrap_or("config/sync.toml");
            println!("Starting trip sync with config: {}", config_path);

            if let Err(e) = sync::run_sync_pipeline(config_path).await {
                eprintln!("Trip sync error: {}", e);
                process::exit(1);
            }
        }

        _ => {
            eprintln!("Please specify a valid subcommand");
            process::exit(1);
        }
    }
}

mod config;
mod ebird;
mod error;
mod notify;
mod parse;
mod record;
mod runner;
mod seen;
mod util;
mod watchlist;

use crate::config::Config;
use crate::parse::Args;
use crate::runner::{RunSummary, run_once};
use crate::util::print_hms;
use clap::Parser;
use log::{error, info};
use std::time::Instant;

pub fn print_summary(config: &Config, summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "Sites polled: {} ({} failed)",
        summary.sites_polled, summary.sites_failed
    );
    println!("Watchlist matches: {}", summary.matches);
    println!("New alerts: {}", summary.new_alerts);
    println!(
        "Seen keys remembered: {} ({})",
        summary.seen_total,
        config.seen_path.display()
    );
}

#[tokio::main]
async fn main() {
    let dotenv_path = dotenv::dotenv().ok();
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match &dotenv_path {
        Some(path) => info!("Loaded environment from {}", path.display()),
        None => info!("No .env file found, using process environment"),
    }

    let config = Config::from_args(args);
    config.warn_missing();

    let client = match ebird::http_client() {
        Ok(client) => client,
        Err(e) => {
            error!("Could not create HTTP client: {}", e);
            return;
        }
    };

    let start = Instant::now();
    let summary = run_once(&config, &client).await;
    print_hms(&start);

    print_summary(&config, &summary);
}

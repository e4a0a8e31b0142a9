use crate::config::Site;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "birdwatch")]
#[command(about = "Alerts on new eBird sightings of watchlisted species near fixed sites")]
#[command(version = "1.0")]
pub(crate) struct Args {
    /// eBird API token
    #[arg(long, env = "EBIRD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Slack-style chat webhook that receives the alerts
    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub slack_webhook: Option<String>,

    /// Webhook that receives one JSON row per alert (e.g. a spreadsheet script)
    #[arg(long, env = "WEBHOOK_LOG_URL", hide_env_values = true)]
    pub sheet_webhook: Option<String>,

    /// Pipe-delimited species names or codes, e.g. "robin|wren|eurrob1"
    #[arg(short, long, env = "WATCHLIST", default_value = "")]
    pub watchlist: String,

    /// Site to poll as ID,NAME,LAT,LON,RADIUS_KM (repeatable)
    #[arg(short, long = "site", value_name = "ID,NAME,LAT,LON,RADIUS_KM")]
    pub sites: Vec<Site>,

    /// How many days back to ask for sightings
    #[arg(short, long, default_value = "3")]
    pub back_days: u32,

    /// Maximum matches handled per site per run
    #[arg(long, default_value = "50")]
    pub max_per_site: usize,

    /// File remembering which sightings were already alerted
    #[arg(long, default_value = "seen.json")]
    pub seen: PathBuf,

    /// Append every alert to a local CSV file
    #[arg(long)]
    pub log_csv: bool,

    /// CSV file used with --log-csv
    #[arg(long, default_value = "alerts.csv")]
    pub csv_path: PathBuf,

    /// Stay silent when a run finds nothing new
    #[arg(long)]
    pub no_news_off: bool,

    /// Base URL of the eBird API
    #[arg(long, default_value = "https://api.ebird.org/v2")]
    pub api_base: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

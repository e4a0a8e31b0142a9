use crate::error::Error;
use crate::parse::Args;
use crate::watchlist;
use log::warn;
use std::path::PathBuf;
use std::str::FromStr;

pub const NO_NEWS_TEXT: &str = "No new sightings";

/// A fixed point and radius to poll for sightings.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub radius_km: u32,
}

impl Site {
    pub fn new(id: &str, name: &str, lat: f64, lon: f64, radius_km: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            lat,
            lon,
            radius_km,
        }
    }

    pub fn london() -> Self {
        Self::new("london", "London Site", 51.44470675255037, -0.20651818603007366, 15)
    }
}

/// Parses `ID,NAME,LAT,LON,RADIUS_KM`.
impl FromStr for Site {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [id, name, lat, lon, radius] = parts.as_slice() else {
            return Err(format!(
                "expected ID,NAME,LAT,LON,RADIUS_KM but got {} field(s)",
                parts.len()
            ));
        };
        if id.is_empty() {
            return Err("site id must not be empty".to_string());
        }

        let lat: f64 = lat.parse().map_err(|e| format!("bad latitude {lat:?}: {e}"))?;
        let lon: f64 = lon.parse().map_err(|e| format!("bad longitude {lon:?}: {e}"))?;
        let radius_km: u32 = radius
            .parse()
            .map_err(|e| format!("bad radius {radius:?}: {e}"))?;

        Ok(Site::new(id, name, lat, lon, radius_km))
    }
}

/// Process-wide settings, built once in `main` and borrowed by every step.
#[derive(Debug, Clone)]
pub struct Config {
    pub ebird_token: Option<String>,
    pub chat_webhook_url: Option<String>,
    pub row_webhook_url: Option<String>,
    pub watchlist: Vec<String>,
    pub sites: Vec<Site>,
    pub back_days: u32,
    pub max_per_site: usize,
    pub seen_path: PathBuf,
    /// Local CSV log; `None` when logging to file is switched off.
    pub csv_path: Option<PathBuf>,
    pub send_no_news: bool,
    pub api_base: String,
}

impl Config {
    pub(crate) fn from_args(args: Args) -> Self {
        let sites = if args.sites.is_empty() {
            vec![Site::london()]
        } else {
            args.sites
        };

        Self {
            ebird_token: non_blank(args.token),
            chat_webhook_url: non_blank(args.slack_webhook),
            row_webhook_url: non_blank(args.sheet_webhook),
            watchlist: watchlist::parse(&args.watchlist),
            sites,
            back_days: args.back_days,
            max_per_site: args.max_per_site,
            seen_path: args.seen,
            csv_path: args.log_csv.then_some(args.csv_path),
            send_no_news: !args.no_news_off,
            api_base: args.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Report absent credentials. The run carries on regardless.
    pub fn missing(&self) -> Vec<Error> {
        let mut missing = Vec::new();
        if self.ebird_token.is_none() {
            missing.push(Error::ConfigMissing("EBIRD_TOKEN"));
        }
        if self.chat_webhook_url.is_none() {
            missing.push(Error::ConfigMissing("SLACK_WEBHOOK_URL"));
        }
        if self.watchlist.is_empty() {
            missing.push(Error::ConfigMissing("WATCHLIST"));
        }
        missing
    }

    pub fn warn_missing(&self) {
        for problem in self.missing() {
            warn!("{} - continuing with current values", problem);
        }
    }
}

#[cfg(test)]
impl Config {
    /// Settings pointing every remote endpoint at `base`.
    pub fn for_tests(base: &str, seen_path: PathBuf) -> Self {
        Self {
            ebird_token: Some("test-token".to_string()),
            chat_webhook_url: Some(format!("{base}/chat")),
            row_webhook_url: Some(format!("{base}/sheet")),
            watchlist: Vec::new(),
            sites: Vec::new(),
            back_days: 3,
            max_per_site: 50,
            seen_path,
            csv_path: None,
            send_no_news: false,
            api_base: base.to_string(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

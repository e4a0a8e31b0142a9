use crate::config::{Config, Site};
use crate::error::{Error, Result};
use crate::record::Observation;
use crate::util::truncate;
use log::{debug, info};
use reqwest::Client;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Build the HTTP client shared by the fetcher and the notification sinks.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("birdwatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(Error::Fetch)
}

/// Reads recent nearby observations from the eBird API.
pub struct EbirdClient {
    client: Client,
    api_base: String,
    token: String,
}

impl EbirdClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_base: config.api_base.clone(),
            token: config.ebird_token.clone().unwrap_or_default(),
        }
    }

    /// Fetch observations within the site's radius over the last `back_days` days.
    pub async fn recent(&self, site: &Site, back_days: u32) -> Result<Vec<Observation>> {
        let url = format!("{}/data/obs/geo/recent", self.api_base);
        debug!("Fetching {} for {}", url, site.name);

        let response = self
            .client
            .get(&url)
            .header("X-eBirdApiToken", &self.token)
            .query(&[
                ("lat", site.lat.to_string()),
                ("lng", site.lon.to_string()),
                ("dist", site.radius_km.to_string()),
                ("back", back_days.to_string()),
            ])
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(Error::Fetch)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Fetch)?;
        if !status.is_success() {
            return Err(Error::FetchStatus {
                status: status.as_u16(),
                body: truncate(&body, 200).to_string(),
            });
        }

        let observations: Vec<Observation> = serde_json::from_str(&body).map_err(Error::Malformed)?;
        info!("{}: fetched {} observations", site.name, observations.len());
        Ok(observations)
    }
}

use crate::config::Config;
use crate::ebird::EbirdClient;
use crate::notify::Notifier;
use crate::record::Observation;
use crate::seen::{SeenSet, obs_key};
use crate::watchlist;
use chrono::Utc;
use log::{debug, info, warn};
use reqwest::Client;

/// Tallies from a single pass over all sites.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub sites_polled: usize,
    pub sites_failed: usize,
    pub matches: usize,
    pub new_alerts: usize,
    pub seen_total: usize,
}

/// Fetch, filter, dedupe and notify for every site, then persist the seen keys.
pub async fn run_once(config: &Config, client: &Client) -> RunSummary {
    info!("Started: {}", Utc::now().to_rfc3339());

    let ebird = EbirdClient::new(client.clone(), config);
    let notifier = Notifier::new(client.clone(), config);
    let mut seen = SeenSet::load(&config.seen_path);
    if seen.is_empty() {
        info!("Seen cache is empty, every match counts as new");
    }
    let mut summary = RunSummary::default();

    for site in &config.sites {
        summary.sites_polled += 1;
        let observations = match ebird.recent(site, config.back_days).await {
            Ok(observations) => observations,
            Err(e) => {
                warn!("eBird fetch failed for {}: {}", site.name, e);
                summary.sites_failed += 1;
                continue;
            }
        };

        let matches: Vec<&Observation> = observations
            .iter()
            .filter(|obs| watchlist::matches(obs, &config.watchlist))
            .collect();
        info!(
            "{}: {} matches in last {} days (radius {}km)",
            site.name,
            matches.len(),
            config.back_days,
            site.radius_km
        );
        summary.matches += matches.len();

        for obs in matches.into_iter().take(config.max_per_site) {
            let key = obs_key(&site.id, obs);
            if seen.contains(&key) {
                debug!("Already alerted: {}", key);
                continue;
            }

            notifier.alert(site, obs).await;
            seen.insert(key);
            summary.new_alerts += 1;
        }
    }

    if let Err(e) = seen.save(&config.seen_path) {
        warn!("{}", e);
    }
    summary.seen_total = seen.len();

    if summary.new_alerts == 0 && config.send_no_news {
        notifier.no_news().await;
    }

    info!("New alerts this run: {}", summary.new_alerts);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Site;
    use crate::ebird::http_client;
    use serde_json::{Value, json};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn robin_json() -> Value {
        json!({
            "comName": "European Robin",
            "speciesCode": "eurrob1",
            "sciName": "Erithacus rubecula",
            "locName": "Richmond Park",
            "obsDt": "2024-01-01 10:00",
            "lat": 51.1,
            "lng": -0.2
        })
    }

    fn heron_json() -> Value {
        json!({
            "comName": "Grey Heron",
            "speciesCode": "graher1",
            "obsDt": "2024-01-01 11:00",
            "lat": 51.2,
            "lng": -0.3
        })
    }

    fn config_for(server: &MockServer, seen_path: &Path, sites: Vec<Site>) -> Config {
        let mut config = Config::for_tests(&server.uri(), seen_path.to_path_buf());
        config.watchlist = watchlist::parse("robin");
        config.sites = sites;
        config
    }

    async fn mount_sightings(server: &MockServer, lat: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path("/data/obs/geo/recent"))
            .and(query_param("lat", lat))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_sink(server: &MockServer, sink_path: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path(sink_path))
            .respond_with(ResponseTemplate::new(200))
            .expect(times)
            .mount(server)
            .await;
    }

    fn stored_keys(path: &Path) -> Vec<String> {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_new_match_is_alerted_and_remembered() {
        let server = MockServer::start().await;
        mount_sightings(&server, "10.5", json!([robin_json(), heron_json()])).await;
        mount_sink(&server, "/chat", 1).await;
        Mock::given(method("POST"))
            .and(path("/sheet"))
            .and(body_partial_json(json!({
                "siteId": "site_id",
                "siteName": "Site",
                "comName": "European Robin",
                "obsDt": "2024-01-01 10:00",
                "lat": 51.1,
                "lng": -0.2
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let seen_path = dir.path().join("seen.json");
        let config = config_for(&server, &seen_path, vec![Site::new("site_id", "Site", 10.5, 1.0, 15)]);

        let summary = run_once(&config, &http_client().unwrap()).await;

        assert_eq!(summary.matches, 1);
        assert_eq!(summary.new_alerts, 1);
        assert_eq!(
            stored_keys(&seen_path),
            vec!["site_id|eurrob1|2024-01-01 10:00|51.1|-0.2"]
        );
    }

    #[tokio::test]
    async fn test_duplicate_in_one_fetch_is_alerted_once() {
        let server = MockServer::start().await;
        mount_sightings(&server, "10.5", json!([robin_json(), robin_json()])).await;
        mount_sink(&server, "/chat", 1).await;
        mount_sink(&server, "/sheet", 1).await;

        let dir = tempdir().unwrap();
        let seen_path = dir.path().join("seen.json");
        let config = config_for(&server, &seen_path, vec![Site::new("park", "Park", 10.5, 1.0, 15)]);

        let summary = run_once(&config, &http_client().unwrap()).await;

        assert_eq!(summary.matches, 2);
        assert_eq!(summary.new_alerts, 1);
        assert_eq!(stored_keys(&seen_path).len(), 1);
    }

    #[tokio::test]
    async fn test_second_run_is_silent() {
        let server = MockServer::start().await;
        mount_sightings(&server, "10.5", json!([robin_json()])).await;
        mount_sink(&server, "/chat", 1).await;
        mount_sink(&server, "/sheet", 1).await;

        let dir = tempdir().unwrap();
        let seen_path = dir.path().join("seen.json");
        let config = config_for(&server, &seen_path, vec![Site::new("park", "Park", 10.5, 1.0, 15)]);
        let client = http_client().unwrap();

        let first = run_once(&config, &client).await;
        let second = run_once(&config, &client).await;

        assert_eq!(first.new_alerts, 1);
        assert_eq!(second.new_alerts, 0);
        assert_eq!(second.seen_total, 1);
    }

    #[tokio::test]
    async fn test_no_news_notice_when_nothing_matches() {
        let server = MockServer::start().await;
        mount_sightings(&server, "10.5", json!([heron_json()])).await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_partial_json(json!({"text": "No new sightings"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        mount_sink(&server, "/sheet", 0).await;

        let dir = tempdir().unwrap();
        let seen_path = dir.path().join("seen.json");
        let mut config = config_for(&server, &seen_path, vec![Site::new("park", "Park", 10.5, 1.0, 15)]);
        config.send_no_news = true;

        let summary = run_once(&config, &http_client().unwrap()).await;

        assert_eq!(summary.new_alerts, 0);
        assert!(stored_keys(&seen_path).is_empty());
    }

    #[tokio::test]
    async fn test_failed_site_does_not_stop_the_rest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/obs/geo/recent"))
            .and(query_param("lat", "20.5"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        mount_sightings(&server, "10.5", json!([robin_json()])).await;
        mount_sink(&server, "/chat", 1).await;
        mount_sink(&server, "/sheet", 1).await;

        let dir = tempdir().unwrap();
        let seen_path = dir.path().join("seen.json");
        let sites = vec![
            Site::new("a", "Site A", 20.5, 1.0, 15),
            Site::new("b", "Site B", 10.5, 1.0, 15),
        ];
        let config = config_for(&server, &seen_path, sites);

        let summary = run_once(&config, &http_client().unwrap()).await;

        assert_eq!(summary.sites_polled, 2);
        assert_eq!(summary.sites_failed, 1);
        assert_eq!(summary.new_alerts, 1);
        assert_eq!(stored_keys(&seen_path), vec!["b|eurrob1|2024-01-01 10:00|51.1|-0.2"]);
    }

    #[tokio::test]
    async fn test_matches_per_site_are_capped() {
        let server = MockServer::start().await;
        let many: Vec<Value> = (0..5)
            .map(|i| {
                let mut obs = robin_json();
                obs["obsDt"] = json!(format!("2024-01-0{} 10:00", i + 1));
                obs
            })
            .collect();
        mount_sightings(&server, "10.5", Value::Array(many)).await;
        mount_sink(&server, "/chat", 2).await;
        mount_sink(&server, "/sheet", 2).await;

        let dir = tempdir().unwrap();
        let seen_path = dir.path().join("seen.json");
        let mut config = config_for(&server, &seen_path, vec![Site::new("park", "Park", 10.5, 1.0, 15)]);
        config.max_per_site = 2;

        let summary = run_once(&config, &http_client().unwrap()).await;

        assert_eq!(summary.matches, 5);
        assert_eq!(summary.new_alerts, 2);
        assert_eq!(
            stored_keys(&seen_path),
            vec![
                "park|eurrob1|2024-01-01 10:00|51.1|-0.2",
                "park|eurrob1|2024-01-02 10:00|51.1|-0.2",
            ]
        );
    }

    #[tokio::test]
    async fn test_previously_seen_keys_are_carried_forward() {
        let server = MockServer::start().await;
        mount_sightings(&server, "10.5", json!([robin_json()])).await;
        mount_sink(&server, "/chat", 0).await;
        mount_sink(&server, "/sheet", 0).await;

        let dir = tempdir().unwrap();
        let seen_path = dir.path().join("seen.json");
        fs::write(
            &seen_path,
            r#"["older|key|t|1|2", "park|eurrob1|2024-01-01 10:00|51.1|-0.2"]"#,
        )
        .unwrap();
        let config = config_for(&server, &seen_path, vec![Site::new("park", "Park", 10.5, 1.0, 15)]);

        let summary = run_once(&config, &http_client().unwrap()).await;

        assert_eq!(summary.new_alerts, 0);
        assert_eq!(stored_keys(&seen_path).len(), 2);
    }
}

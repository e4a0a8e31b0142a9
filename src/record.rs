use crate::config::Site;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One sighting as returned by the eBird recent-observations endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub com_name: String,
    pub species_code: String,
    #[serde(default)]
    pub sci_name: Option<String>,
    #[serde(default)]
    pub loc_name: Option<String>,
    pub obs_dt: String,
    pub lat: f64,
    pub lng: f64,
}

impl Default for Observation {
    fn default() -> Self {
        Self {
            com_name: String::new(),
            species_code: String::new(),
            sci_name: None,
            loc_name: None,
            obs_dt: String::new(),
            lat: 0.0,
            lng: 0.0,
        }
    }
}

/// Row written to the local CSV log and posted to the row webhook.
///
/// Field order matches the CSV header:
/// `ts,siteId,siteName,comName,sciName,locName,obsDt,lat,lng`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRow {
    pub ts: String,
    pub site_id: String,
    pub site_name: String,
    pub com_name: String,
    pub sci_name: Option<String>,
    pub loc_name: Option<String>,
    pub obs_dt: String,
    pub lat: f64,
    pub lng: f64,
}

impl AlertRow {
    pub fn new(site: &Site, obs: &Observation) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            site_id: site.id.clone(),
            site_name: site.name.clone(),
            com_name: obs.com_name.clone(),
            sci_name: obs.sci_name.clone(),
            loc_name: obs.loc_name.clone(),
            obs_dt: obs.obs_dt.clone(),
            lat: obs.lat,
            lng: obs.lng,
        }
    }
}

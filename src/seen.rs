use crate::error::Result;
use crate::record::Observation;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

/// Cap on the number of keys written back to disk.
pub const MAX_SEEN: usize = 5000;

/// Identity of a sighting: site, species code, observation time and coordinates.
pub fn obs_key(site_id: &str, obs: &Observation) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        site_id, obs.species_code, obs.obs_dt, obs.lat, obs.lng
    )
}

/// Keys of sightings that were already alerted, in the order they were added.
#[derive(Debug, Default)]
pub struct SeenSet {
    order: Vec<String>,
    index: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted keys. A missing or unreadable file yields an empty set.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No seen cache at {}, starting fresh", path.display());
                return Self::new();
            }
            Err(e) => {
                warn!("Could not read seen cache {}: {}", path.display(), e);
                return Self::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&text) {
            Ok(keys) => {
                let seen: SeenSet = keys.into_iter().collect();
                info!("Loaded {} seen keys from {}", seen.len(), path.display());
                seen
            }
            Err(e) => {
                warn!("Ignoring malformed seen cache {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Write the most recently added `MAX_SEEN` keys as a JSON array, oldest first.
    pub fn save(&self, path: &Path) -> Result<()> {
        let start = self.order.len().saturating_sub(MAX_SEEN);
        let kept = &self.order[start..];
        let json = serde_json::to_vec(kept).map_err(io::Error::from)?;
        fs::write(path, json)?;
        debug!("Saved {} seen keys to {}", kept.len(), path.display());
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains(key)
    }

    /// Returns false if the key was already present.
    pub fn insert(&mut self, key: String) -> bool {
        if !self.index.insert(key.clone()) {
            return false;
        }
        self.order.push(key);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromIterator<String> for SeenSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut seen = SeenSet::new();
        for key in iter {
            seen.insert(key);
        }
        seen
    }
}

use crate::record::Observation;

/// Split a pipe-delimited watchlist into trimmed, lowercased, non-empty entries.
pub fn parse(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// True when the common name contains an entry or the species code equals one.
///
/// An empty watchlist matches nothing.
pub fn matches(obs: &Observation, watchlist: &[String]) -> bool {
    if watchlist.is_empty() {
        return false;
    }
    let name = obs.com_name.to_lowercase();
    let code = obs.species_code.to_lowercase();

    watchlist
        .iter()
        .any(|w| name.contains(w.as_str()) || code == *w)
}

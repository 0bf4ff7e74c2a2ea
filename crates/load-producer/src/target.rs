//! Target URL Normalization

use url::Url;

use crate::error::TargetError;

/// Alert ingestion path used when a target URL has none
pub const DEFAULT_ALERTS_PATH: &str = "/api/v1/alerts";

/// Strip trailing slashes from the path and fall back to the default
/// ingestion path when nothing is left
pub fn normalize_target(raw: &str) -> Result<String, TargetError> {
    let raw = raw.trim();
    let mut url = Url::parse(raw).map_err(|source| TargetError::Invalid {
        target: raw.to_string(),
        source,
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(TargetError::UnsupportedScheme(raw.to_string()));
    }

    let path = url.path().trim_end_matches('/').to_string();
    if path.is_empty() {
        url.set_path(DEFAULT_ALERTS_PATH);
    } else {
        url.set_path(&path);
    }
    Ok(url.to_string())
}

/// Normalize a comma-separated target list, skipping empty entries
pub fn parse_targets(list: &str) -> Result<Vec<String>, TargetError> {
    list.split(',')
        .filter(|t| !t.trim().is_empty())
        .map(normalize_target)
        .collect()
}

//! Label Sets and Alerts

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label carrying the metric name of an exposition sample
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Mapping of label name to label value identifying one alert.
///
/// Names are unique and case-sensitive. Iteration is always in ascending
/// name order regardless of how the set was built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// Create an empty label set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label, returning the previous value if the name was present
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Look up a label value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether the set contains the given label name
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(name, value)` pairs sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect())
    }
}

/// Alert as posted to targets and echoed back in notifications.
///
/// Inbound alerts carry more fields (status, annotations, timestamps);
/// only the labels take part in identity, everything else is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default, skip_serializing_if = "LabelSet::is_empty")]
    pub labels: LabelSet,
}

impl Alert {
    pub fn new(labels: LabelSet) -> Self {
        Self { labels }
    }
}

impl From<LabelSet> for Alert {
    fn from(labels: LabelSet) -> Self {
        Self::new(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_is_sorted_by_name() {
        let labels: LabelSet = [("zone", "b"), ("alertname", "Down"), ("job", "api")]
            .into_iter()
            .collect();

        let names: Vec<_> = labels.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["alertname", "job", "zone"]);
    }

    #[test]
    fn test_alert_wire_format() {
        let alert = Alert::new([("alertname", "Down")].into_iter().collect());
        let json = serde_json::to_string(&vec![alert]).unwrap();
        assert_eq!(json, r#"[{"labels":{"alertname":"Down"}}]"#);
    }

    #[test]
    fn test_inbound_alert_ignores_extra_fields() {
        let raw = r#"{
            "status": "firing",
            "labels": {"alertname": "Down", "job": "api"},
            "annotations": {"summary": "it broke"},
            "startsAt": "2020-01-01T00:00:00Z"
        }"#;
        let alert: Alert = serde_json::from_str(raw).unwrap();
        assert_eq!(alert.labels.len(), 2);
        assert_eq!(alert.labels.get("job"), Some("api"));
    }

    #[test]
    fn test_missing_labels_decode_as_empty() {
        let alert: Alert = serde_json::from_str("{}").unwrap();
        assert!(alert.labels.is_empty());
    }
}

use serde::{Deserialize, Serialize};

/// Server-computed aggregate for one session. Displayed as-is, never derived
/// from the event list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub events_total: u64,
    pub duration_sec: f64,
    #[serde(default)]
    pub attention_avg: Option<f64>,
    pub attention_pct: f64,
    #[serde(default)]
    pub offroad_count: Option<u64>,
    pub offroad_pct: f64,
    #[serde(default)]
    pub phone_count: Option<u64>,
    pub phone_pct: f64,
    #[serde(default)]
    pub drowsy_count: Option<u64>,
    pub drowsy_pct: f64,
}

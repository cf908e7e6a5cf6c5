use serde::{Deserialize, Serialize};

/// One recorded driver-monitoring session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub started_at: String,
    pub source: String,
    #[serde(default)]
    pub notes: Option<String>,
}

use serde::{Deserialize, Serialize};

/// Event type carrying the numeric attention level charted by the timeline.
pub const ATTENTION: &str = "attention";

/// One timestamped observation within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub ts: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: EventValue,
    #[serde(default)]
    pub confidence: Confidence,
}

/// Event payload: a level for `attention`, a flag for `offroad`/`phone`/`drowsy`.
///
/// Anything else the backend sends is kept verbatim in `Other` so it can
/// still be displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventValue {
    Flag(bool),
    Number(f64),
    Other(serde_json::Value),
}

impl EventValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            EventValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Detector confidence. Normally a number in `[0, 1]`; a missing, null or
/// non-numeric field is kept in `Other` instead of failing the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    Score(f64),
    Other(serde_json::Value),
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence::Other(serde_json::Value::Null)
    }
}

impl Confidence {
    pub fn as_score(&self) -> Option<f64> {
        match self {
            Confidence::Score(n) => Some(*n),
            Confidence::Other(_) => None,
        }
    }
}

impl Event {
    /// Parsed timestamp in Unix milliseconds, `None` if `ts` is not ISO-8601.
    pub fn ts_millis(&self) -> Option<i64> {
        crate::time::parse_millis(&self.ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_shape() {
        let raw = json!([
            { "ts": "2026-03-01T10:00:00Z", "type": "attention", "value": 0.82, "confidence": 0.9 },
            { "ts": "2026-03-01T10:00:01Z", "type": "phone", "value": true, "confidence": 0.7 },
            { "ts": "2026-03-01T10:00:02Z", "type": "attention", "value": 1, "confidence": 0.5 }
        ]);
        let events: Vec<Event> = serde_json::from_value(raw).expect("events should decode");

        assert_eq!(events[0].kind, "attention");
        assert_eq!(events[0].value, EventValue::Number(0.82));
        assert_eq!(events[1].value, EventValue::Flag(true));
        assert_eq!(events[2].value.as_number(), Some(1.0));
    }

    #[test]
    fn test_malformed_value_passes_through() {
        let event: Event = serde_json::from_value(json!({
            "ts": "2026-03-01T10:00:00Z", "type": "attention", "value": "high", "confidence": 1.7
        }))
        .expect("malformed value should still decode");

        assert_eq!(event.value, EventValue::Other(json!("high")));
        assert_eq!(event.value.as_number(), None);
        assert_eq!(event.confidence, Confidence::Score(1.7));
    }

    #[test]
    fn test_bad_confidence_keeps_the_rest_of_the_list() {
        let raw = json!([
            { "ts": "2026-03-01T10:00:00Z", "type": "attention", "value": 0.8, "confidence": 0.9 },
            { "ts": "2026-03-01T10:00:01Z", "type": "phone", "value": true, "confidence": null },
            { "ts": "2026-03-01T10:00:02Z", "type": "offroad", "value": false, "confidence": "n/a" },
            { "ts": "2026-03-01T10:00:03Z", "type": "drowsy", "value": true }
        ]);
        let events: Vec<Event> =
            serde_json::from_value(raw).expect("one bad confidence must not fail the list");

        assert_eq!(events.len(), 4);
        assert_eq!(events[0].confidence.as_score(), Some(0.9));
        assert_eq!(events[1].confidence, Confidence::Other(json!(null)));
        assert_eq!(events[2].confidence, Confidence::Other(json!("n/a")));
        assert_eq!(events[3].confidence, Confidence::default());
        assert_eq!(events[3].confidence.as_score(), None);
    }

    #[test]
    fn test_type_field_serializes_back_as_type() {
        let event = Event {
            ts: "2026-03-01T10:00:00Z".to_string(),
            kind: "drowsy".to_string(),
            value: EventValue::Flag(false),
            confidence: Confidence::Score(0.4),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "drowsy");
        assert_eq!(value["value"], false);
    }
}

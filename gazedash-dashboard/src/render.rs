//! Plain-text rendering for the terminal dashboard.

use gazedash_core::time::{clock_label, local_datetime_label};
use gazedash_core::{Confidence, Event, EventValue, Session, Stats};

use crate::subsystems::timeline::TimeBucket;

const BAR_WIDTH: f64 = 40.0;

pub fn format_event_value(value: &EventValue) -> String {
    match value {
        EventValue::Flag(true) => "true".to_string(),
        EventValue::Flag(false) => "false".to_string(),
        EventValue::Number(n) => format!("{:.2}", n),
        EventValue::Other(raw) => raw.to_string(),
    }
}

/// Two decimals for a score; anything else the API sent is shown as raw JSON.
pub fn format_confidence(confidence: &Confidence) -> String {
    match confidence {
        Confidence::Score(n) => format!("{:.2}", n),
        Confidence::Other(raw) => raw.to_string(),
    }
}

/// Event time as local `HH:MM:SS`, or the raw string if it does not parse.
pub fn format_event_time(event: &Event) -> String {
    match event.ts_millis() {
        Some(ms) => clock_label(ms),
        None => event.ts.clone(),
    }
}

/// Summary metric cards, in display order.
pub fn metrics(stats: &Stats) -> Vec<(&'static str, String)> {
    vec![
        ("Events total", stats.events_total.to_string()),
        ("Duration", format!("{}s", stats.duration_sec.round())),
        ("Attention", format!("{:.1}%", stats.attention_pct)),
        ("Offroad", format!("{:.1}%", stats.offroad_pct)),
        ("Phone", format!("{:.1}%", stats.phone_pct)),
        ("Drowsy", format!("{:.1}%", stats.drowsy_pct)),
    ]
}

pub fn render_sessions(sessions: &[Session]) -> String {
    if sessions.is_empty() {
        return "No sessions\n".to_string();
    }
    let mut out = format!("{:<12} {:<20} {:<10} {}\n", "ID", "STARTED", "SOURCE", "NOTES");
    for s in sessions {
        out.push_str(&format!(
            "{:<12} {:<20} {:<10} {}\n",
            s.id,
            local_datetime_label(&s.started_at),
            s.source,
            s.notes.as_deref().unwrap_or("")
        ));
    }
    out
}

pub fn render_session_header(session_id: &str, session: Option<&Session>, shown: usize) -> String {
    let mut out = format!("Session #{}  ({} events)\n", session_id, shown);
    if let Some(s) = session {
        out.push_str(&format!("  Started: {}\n", local_datetime_label(&s.started_at)));
        out.push_str(&format!("  Source:  {}\n", s.source));
        if let Some(notes) = s.notes.as_deref().filter(|n| !n.is_empty()) {
            out.push_str(&format!("  Notes:   {}\n", notes));
        }
    }
    out
}

pub fn render_metrics(stats: &Stats) -> String {
    let cards: Vec<String> = metrics(stats)
        .into_iter()
        .map(|(title, value)| format!("{}: {}", title, value))
        .collect();
    format!("{}\n", cards.join(" | "))
}

pub fn render_event_table(events: &[&Event]) -> String {
    if events.is_empty() {
        return "No events\n".to_string();
    }
    let mut out = format!("{:<10} {:<12} {:>8} {:>10}\n", "TIME", "TYPE", "VALUE", "CONFIDENCE");
    for e in events {
        out.push_str(&format!(
            "{:<10} {:<12} {:>8} {:>10}\n",
            format_event_time(e),
            e.kind,
            format_event_value(&e.value),
            format_confidence(&e.confidence)
        ));
    }
    out
}

/// Horizontal bar per bucket, scaled to the `[0, 1]` attention range.
pub fn render_timeline(buckets: &[TimeBucket], bin_seconds: u32) -> String {
    if buckets.is_empty() {
        return "No attention points yet\n".to_string();
    }
    let mut out = String::new();
    for b in buckets {
        let filled = (b.average_attention.clamp(0.0, 1.0) * BAR_WIDTH).round() as usize;
        out.push_str(&format!(
            "{:<8} +{:>5}s {:.2} {}\n",
            b.label,
            b.offset_secs,
            b.average_attention,
            "#".repeat(filled)
        ));
    }
    out.push_str(&format!("Bin: {}s, value = avg(attention)\n", bin_seconds.max(1)));
    out
}

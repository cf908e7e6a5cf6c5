//! Timeline subsystem: bins attention samples into fixed-width windows
//!
//! Only `attention` events with a numeric value are charted. Samples are
//! re-sorted by time (source order is not trusted), offset from the earliest
//! sample in whole seconds, and averaged per window.

use std::collections::BTreeMap;

use gazedash_core::{time, Event, ATTENTION};
use serde::Serialize;

/// One chart point: the mean attention within a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucket {
    /// Window start in seconds from the first sample; a multiple of the bin width.
    pub offset_secs: i64,
    /// `first sample + offset_secs`, in Unix milliseconds.
    pub start_millis: i64,
    /// Local wall-clock label of `start_millis`. Presentation only.
    pub label: String,
    pub average_attention: f64,
    pub samples: usize,
}

struct Accumulator {
    start_millis: i64,
    sum: f64,
    count: usize,
}

/// Bucket the attention series of `events` into `bin_seconds`-wide windows.
///
/// A `bin_seconds` of zero is treated as one second.
pub fn aggregate_attention(events: &[Event], bin_seconds: u32) -> Vec<TimeBucket> {
    let bin = i64::from(bin_seconds.max(1));

    let mut samples: Vec<(i64, f64)> = events
        .iter()
        .filter(|e| e.kind == ATTENTION)
        .filter_map(|e| Some((e.ts_millis()?, e.value.as_number()?)))
        .collect();

    // Value as a secondary key keeps the summation order independent of input order.
    samples.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let Some(&(start, _)) = samples.first() else {
        return Vec::new();
    };

    let mut buckets: BTreeMap<i64, Accumulator> = BTreeMap::new();
    for (ts, value) in samples {
        let secs_from_start = (ts - start).div_euclid(1000);
        let offset = secs_from_start.div_euclid(bin) * bin;

        let acc = buckets.entry(offset).or_insert_with(|| Accumulator {
            start_millis: start + offset * 1000,
            sum: 0.0,
            count: 0,
        });
        acc.sum += value;
        acc.count += 1;
    }

    buckets
        .into_iter()
        .map(|(offset, acc)| TimeBucket {
            offset_secs: offset,
            start_millis: acc.start_millis,
            label: time::clock_label(acc.start_millis),
            average_attention: acc.sum / acc.count as f64,
            samples: acc.count,
        })
        .collect()
}

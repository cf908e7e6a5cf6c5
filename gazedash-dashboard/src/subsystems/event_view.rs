//! Event view: filtered and sorted projections of a session's event list
//!
//! Everything here is pure: the input slice is never reordered, and each
//! call builds a fresh sequence.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use gazedash_core::Event;

/// Which event types to keep.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(String),
}

impl TypeFilter {
    pub fn matches(&self, kind: &str) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(wanted) => wanted == kind,
        }
    }
}

/// `"all"` selects every type; anything else is an exact type name.
impl FromStr for TypeFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" => TypeFilter::All,
            other => TypeFilter::Only(other.to_string()),
        })
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFilter::All => f.write_str("all"),
            TypeFilter::Only(kind) => f.write_str(kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{}': expected asc or desc", other)),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("ASC"),
            SortDirection::Desc => f.write_str("DESC"),
        }
    }
}

/// What an event table needs: the visible rows plus the type selector options.
#[derive(Debug, Clone, PartialEq)]
pub struct EventView<'a> {
    pub events: Vec<&'a Event>,
    pub types: Vec<String>,
}

pub fn derive_view<'a>(
    events: &'a [Event],
    filter: &TypeFilter,
    direction: SortDirection,
) -> EventView<'a> {
    EventView {
        events: filter_and_sort(events, filter, direction),
        types: distinct_types(events),
    }
}

/// Keep events matching `filter`, stably sorted by parsed timestamp.
///
/// Timestamps that fail to parse order before every valid one when
/// ascending (after every valid one when descending).
pub fn filter_and_sort<'a>(
    events: &'a [Event],
    filter: &TypeFilter,
    direction: SortDirection,
) -> Vec<&'a Event> {
    let mut keyed: Vec<(Option<i64>, &Event)> = events
        .iter()
        .filter(|e| filter.matches(&e.kind))
        .map(|e| (e.ts_millis(), e))
        .collect();

    match direction {
        SortDirection::Asc => keyed.sort_by(|a, b| a.0.cmp(&b.0)),
        SortDirection::Desc => keyed.sort_by(|a, b| b.0.cmp(&a.0)),
    }

    keyed.into_iter().map(|(_, e)| e).collect()
}

/// Distinct event types in `events`, lexicographically sorted.
pub fn distinct_types(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .map(|e| e.kind.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

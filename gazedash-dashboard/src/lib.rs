pub mod render;
pub mod subsystems;

pub use subsystems::controller::{
    join_cycle, CycleOutcome, FetchScope, SessionController, SessionState, ViewStatus,
};
pub use subsystems::event_view::{
    derive_view, distinct_types, filter_and_sort, EventView, SortDirection, TypeFilter,
};
pub use subsystems::timeline::{aggregate_attention, TimeBucket};

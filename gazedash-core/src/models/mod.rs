pub mod event;
pub mod session;
pub mod stats;

pub use event::{Confidence, Event, EventValue, ATTENTION};
pub use session::Session;
pub use stats::Stats;

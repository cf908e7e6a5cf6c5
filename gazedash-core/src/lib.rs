pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod time;

pub use api::{Health, HttpSessionGateway, SessionGateway};
pub use config::GazeDashConfig;
pub use error::GazeDashError;
pub use http::{HttpClient, RequestError, RequestOptions};
pub use models::{Confidence, Event, EventValue, Session, Stats, ATTENTION};
pub use tokio_util::sync::CancellationToken;

use thiserror::Error;

use crate::http::RequestError;

#[derive(Error, Debug)]
pub enum GazeDashError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Request(#[from] RequestError),
}

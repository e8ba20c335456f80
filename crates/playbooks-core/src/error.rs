use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybooksError {
    #[error("not initialized: run 'playbooks init'")]
    NotInitialized,

    #[error("invalid action type: {0}")]
    InvalidActionType(String),

    #[error("invalid trigger type: {0}")]
    InvalidTriggerType(String),

    #[error("invalid channel type: {0}")]
    InvalidChannelType(String),

    #[error("invalid channel action: {reason}")]
    InvalidAction { reason: String },

    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidRoutePattern { pattern: String, reason: String },

    #[error("playbooks API returned {status} for {url}: {body}")]
    Api {
        status: u16,
        url: String,
        body: String,
    },

    #[error("viewed store error: {0}")]
    ViewedDb(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlaybooksError>;

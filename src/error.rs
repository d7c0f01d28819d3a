use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid cron schedule `{expr}`: {reason}")]
    Schedule { expr: String, reason: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Malformed queue message: {0}")]
    MalformedMessage(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing collaborator: {0}")]
    MissingDependency(String),
}

impl Error {
    /// Build a schedule error from a failed parse.
    pub fn schedule(expr: &str, reason: impl ToString) -> Self {
        Error::Schedule {
            expr: expr.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

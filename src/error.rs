use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Plan error: {0}")]
    Plan(String),

    #[error("Policy error: {0}")]
    Policy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GuardError>;

use hublink_client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Invalid configuration file: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Device client error: {0}")]
    Client(#[from] ClientError),
}

pub type Result<T> = std::result::Result<T, RunnerError>;

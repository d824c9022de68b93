use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskGameError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Remote store error: {0}")]
    RemoteError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unknown member: {0}")]
    UnknownMember(String),
    #[error("Member '{member}' is not allowed to complete '{chore}'")]
    IneligibleMember { member: String, chore: String },
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("configuration file not found in '{0}'")]
    NotFound(PathBuf),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
    #[error(transparent)]
    BsonSerialization(#[from] bson::ser::Error),
    #[error(transparent)]
    BsonDeserialization(#[from] bson::de::Error),
    #[error("storage backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media host request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("media host rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unable to read uploaded file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("email build error: {0}")]
    Build(String),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    // External errors
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
    #[error(transparent)]
    Mail(#[from] MailError),
    #[error(transparent)]
    Cors(#[from] rocket_cors::Error),
}

use crate::error::ConfigurationError;
use crate::util;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

fn default_mongodb_uri() -> String {
    env::var("MONGODB_URI").unwrap_or("mongodb://localhost:27017".to_string())
}

fn default_mongodb_db() -> String {
    env::var("MONGODB_DB_NAME").unwrap_or("studynotion".to_string())
}

fn default_jwt_secret() -> String {
    env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set, generating a random secret.");
        let secret: [u8; 32] = rand::random();
        secret.iter().map(|b| format!("{:02x}", b)).collect()
    })
}

fn default_cors_origins() -> Vec<String> {
    env::var("CORS_ORIGINS")
        .map(|it| it.split(',').map(|o| o.trim().to_string()).collect())
        .unwrap_or(vec!["http://localhost:3000".to_string()])
}

fn default_media() -> Option<MediaConfig> {
    Some(MediaConfig {
        cloud_name: env::var("CLOUD_NAME").ok()?,
        api_key: env::var("API_KEY").ok()?,
        api_secret: env::var("API_SECRET").ok()?,
        folder: default_media_folder(),
    })
}

fn default_media_folder() -> String {
    env::var("FOLDER_NAME").unwrap_or("StudyNotion".to_string())
}

fn default_mail() -> Option<MailConfig> {
    Some(MailConfig {
        host: env::var("MAIL_HOST").ok()?,
        port: default_mail_port(),
        user: env::var("MAIL_USER").ok(),
        password: env::var("MAIL_PASS").ok(),
        from: default_mail_from(),
    })
}

fn default_mail_port() -> u16 {
    env::var("MAIL_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(587)
}

fn default_mail_from() -> String {
    env::var("MAIL_FROM")
        .or_else(|_| env::var("MAIL_USER"))
        .unwrap_or("noreply@studynotion.local".to_string())
}

/// Credentials for the Cloudinary-compatible media host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    #[serde(default = "default_media_folder")]
    pub folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub host: String,
    #[serde(default = "default_mail_port")]
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_mail_from")]
    pub from: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    file_path: PathBuf,

    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_mongodb_db")]
    pub mongodb_db: String,

    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_media")]
    pub media: Option<MediaConfig>,
    #[serde(default = "default_mail")]
    pub mail: Option<MailConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file_path: config_dir().join("settings.yml"),
            mongodb_uri: default_mongodb_uri(),
            mongodb_db: default_mongodb_db(),
            jwt_secret: default_jwt_secret(),
            cors_origins: default_cors_origins(),
            media: default_media(),
            mail: default_mail(),
        }
    }
}

#[inline]
fn config_dir() -> PathBuf {
    PathBuf::from(env::var("CONFIG_DIR").unwrap_or("./config".to_string()))
}

impl Config {
    pub fn load() -> Result<Config, ConfigurationError> {
        let config_file = util::find_first_subpath(
            config_dir(),
            &["settings.yml", "settings.yaml"],
            Path::exists,
        )
        .ok_or_else(|| ConfigurationError::NotFound(config_dir()))?;

        let file = File::open(&config_file)?;
        let mut config: Config = serde_yaml::from_reader(BufReader::new(file))?;
        config.file_path = config_file;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigurationError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.file_path)?;
        let mut out = BufWriter::new(file);
        serde_yaml::to_writer(&mut out, self)?;
        out.flush()?;
        Ok(())
    }

    /// Configuration used by tests: no external services, fixed secret.
    #[cfg(test)]
    pub fn for_tests(jwt_secret: impl ToString) -> Config {
        Config {
            file_path: PathBuf::new(),
            mongodb_uri: String::new(),
            mongodb_db: String::new(),
            jwt_secret: jwt_secret.to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            media: None,
            mail: None,
        }
    }
}

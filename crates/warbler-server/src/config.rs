use std::path::PathBuf;

use tracing::warn;

/// Placeholder secrets that sign forgeable sessions.
const PLACEHOLDER_SECRETS: &[&str] = &["dev-secret-change-me", "change-me-to-a-random-string"];

pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key =
            std::env::var("SECRET_KEY").unwrap_or_else(|_| "dev-secret-change-me".into());
        if PLACEHOLDER_SECRETS.contains(&secret_key.as_str()) {
            warn!("SECRET_KEY is unset or a placeholder; sessions can be forged");
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| "warbler.db".into()),
            secret_key,
            host: std::env::var("WARBLER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("WARBLER_PORT")
                .unwrap_or_else(|_| "5000".into())
                .parse()?,
            static_dir: std::env::var("WARBLER_STATIC_DIR")
                .unwrap_or_else(|_| "./static".into())
                .into(),
        })
    }
}

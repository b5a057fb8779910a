use std::{path::PathBuf, str::FromStr};

use anyhow::Context;
use phonenumber::country;

/// Image extensions accepted by `/api/submit`.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub upload_dir: PathBuf,
    /// Numbering plan used to validate submitted phone numbers.
    pub phone_region: country::Id,
    pub image_max_dimension: u32,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let region = std::env::var("PHONE_REGION").unwrap_or_else(|_| "NG".into());
        Ok(Self {
            database_url,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".into())
                .into(),
            phone_region: parse_region(&region)?,
            image_max_dimension: env_or("IMAGE_MAX_DIMENSION", 500)?,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 16 * 1024 * 1024)?,
        })
    }
}

pub fn parse_region(code: &str) -> anyhow::Result<country::Id> {
    country::Id::from_str(&code.trim().to_uppercase())
        .map_err(|_| anyhow::anyhow!("unknown phone region {code:?}"))
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}={v:?}: {e}")),
        Err(_) => Ok(default),
    }
}

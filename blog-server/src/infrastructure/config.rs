use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::pagination::DEFAULT_PER_PAGE;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub posts_per_page: usize,
    pub templates_dir: PathBuf,
    pub media_root: PathBuf,
    pub media_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url = database_url()?;
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let session_ttl_hours = std::env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "24".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid SESSION_TTL_HOURS: {}", e))?;
        let posts_per_page = std::env::var("POSTS_PER_PAGE")
            .unwrap_or_else(|_| DEFAULT_PER_PAGE.to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid POSTS_PER_PAGE: {}", e))?;
        let templates_dir = std::env::var("TEMPLATES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_templates_dir());
        let media_root = std::env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));
        let media_url = std::env::var("MEDIA_URL")
            .unwrap_or_else(|_| "/media".into())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            session_ttl_hours,
            posts_per_page,
            templates_dir,
            media_root,
            media_url,
        })
    }
}

/// Reads only the database location, for tools that do not serve HTTP.
pub fn database_url() -> anyhow::Result<String> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))
}

pub fn default_templates_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
}

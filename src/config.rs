use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Secret key the recovery tokens are derived from.
    pub site_secret: String,
    /// Base URL of the storefront the checkout deep links point at.
    pub storefront_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let site_secret = env::var("SITE_SECRET")
            .map_err(|_| anyhow::anyhow!("SITE_SECRET is not set"))?;
        let storefront_url =
            env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
        Ok(Self {
            database_url,
            host,
            port,
            site_secret,
            storefront_url,
        })
    }
}

use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Base URL of the external payment checkout page. When unset, checkout
    /// responses fall back to the mock confirmation flow.
    pub payment_checkout_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let payment_checkout_url = env::var("PAYMENT_CHECKOUT_URL")
            .ok()
            .filter(|url| !url.is_empty());
        Ok(Self {
            port,
            database_url,
            host,
            payment_checkout_url,
        })
    }
}

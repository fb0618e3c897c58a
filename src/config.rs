use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub jwt_secret: String,
    /// Store number the checkout hand-off link points at, digits only.
    pub whatsapp_number: String,
    /// Commission percentage used until an admin stores `commission_rate`.
    pub default_commission_rate: String,
    pub low_stock_threshold: i32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let whatsapp_number = env::var("WHATSAPP_NUMBER")
            .unwrap_or_else(|_| "819000000000".to_string())
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        let default_commission_rate =
            env::var("DEFAULT_COMMISSION_RATE").unwrap_or_else(|_| "5".to_string());
        let low_stock_threshold = env::var("LOW_STOCK_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(5);
        Ok(Self {
            database_url,
            host,
            port,
            max_connections,
            jwt_secret,
            whatsapp_number,
            default_commission_rate,
            low_stock_threshold,
        })
    }
}

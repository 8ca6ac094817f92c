use std::env;

use anyhow::Context;

/// runtime configuration sourced from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
}

impl Config {
    /// read configuration from the environment, applying defaults for the
    /// server address; DATABASE_URL is required
    pub fn from_env() -> anyhow::Result<Self> {
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid port number")?;
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        Ok(Config {
            server_host,
            server_port,
            database_url,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

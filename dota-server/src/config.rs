use std::env;

/// Server configuration loaded from the environment, in the same shape as
/// `social-network-api::config::Config::from_env`.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// Loads configuration from the environment, falling back to `.env` in
    /// the current directory and then to defaults. `db_path` comes from the
    /// CLI's positional argument, not the environment.
    pub fn from_env(db_path: String) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            server: ServerConfig {
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "9002".to_string())
                    .parse()?,
            },
            database: DatabaseConfig { path: db_path },
            logging: LoggingConfig {
                level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}

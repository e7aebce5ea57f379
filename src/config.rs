// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub questions_path: PathBuf,
    pub reminder_interval: Duration,
    pub bind_addr: SocketAddr,
    pub log_dir: PathBuf,
}

fn var_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration: var_or("JWT_EXPIRATION", 86_400),
            rust_log,
            questions_path: var_or("QUESTIONS_PATH", PathBuf::from("config/questions.json")),
            reminder_interval: Duration::from_secs(var_or("REMINDER_INTERVAL_SECS", 60u64).max(1)),
            bind_addr: var_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000))),
            log_dir: var_or("LOG_DIR", PathBuf::from("logs")),
        }
    }
}

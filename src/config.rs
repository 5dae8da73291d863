use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub host: IpAddr,
    pub port: u16,
    pub frontend_origin: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let token_ttl_days: i64 = env_or("TASKBOARD_TOKEN_TTL_DAYS", "7")
            .parse()
            .map_err(|e| format!("Invalid TASKBOARD_TOKEN_TTL_DAYS: {e}"))?;

        let host: IpAddr = env_or("TASKBOARD_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid TASKBOARD_HOST: {e}"))?;

        let port: u16 = env_or("TASKBOARD_PORT", "4000")
            .parse()
            .map_err(|e| format!("Invalid TASKBOARD_PORT: {e}"))?;

        let frontend_origin = env_or("TASKBOARD_FRONTEND_ORIGIN", "http://localhost:3000");
        let log_level = env_or("TASKBOARD_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            token_ttl_days,
            host,
            port,
            frontend_origin,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

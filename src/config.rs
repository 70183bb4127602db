use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Shared secret expected in the `x-api-secret` header of `/check-license`.
    /// When unset, every verification request is rejected.
    pub api_secret: Option<String>,
    /// Lifetime of a login session
    pub session_ttl_hours: i64,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("LICENSEHUB_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let session_ttl_hours: i64 = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|h: &i64| *h > 0)
            .unwrap_or(720);

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "licensehub.db".to_string()),
            api_secret: env::var("API_SECRET").ok().filter(|s| !s.is_empty()),
            session_ttl_hours,
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

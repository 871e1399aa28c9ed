use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub database_url: String,
    pub pool_size: u32,
    pub jwt_secret: String,
    pub jwt_expires: i64,
    pub bind_address: String,
    pub port: u16,
    /// Empty means any origin may call the API.
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_url: require("DATABASE_URL"),
            pool_size: try_load("DATABASE_POOL_SIZE", "10"),
            jwt_secret: require("JWT_SECRET"),
            jwt_expires: try_load("JWT_TOKEN_EXPIRES", "360000"),
            bind_address: try_load("BIND_ADDRESS", "0.0.0.0"),
            port: try_load("PORT", "5000"),
            cors_origins: parse_origins(env::var("CORS_ALLOWED_ORIGINS").ok()),
        }
    }
}

fn parse_origins(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found");
    })
}

fn require(key: &str) -> String {
    var(key).unwrap_or_else(|_| panic!("No value specified in environment variable {key}."))
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    parse_or_default(key, var(key).ok(), default).expect("Environment misconfigured!")
}

fn parse_or_default<T: FromStr>(key: &str, value: Option<String>, default: &str) -> Result<T, String>
where
    T::Err: Display,
{
    value
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            format!("invalid {key}: {e}")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_value_uses_default() {
        let port: u16 = parse_or_default("PORT", None, "5000").unwrap();
        assert_eq!(port, 5000);
    }

    #[test]
    fn supplied_value_wins() {
        let expires: i64 = parse_or_default("JWT_TOKEN_EXPIRES", Some("60".into()), "3600").unwrap();
        assert_eq!(expires, 60);
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        assert!(parse_origins(None).is_empty());
        assert!(parse_origins(Some(" , ".into())).is_empty());
        assert_eq!(
            parse_origins(Some("https://a.example, https://b.example".into())),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn malformed_value_is_an_error() {
        let port: Result<u16, _> = parse_or_default("PORT", Some("eighty".into()), "5000");
        assert!(port.is_err());
    }
}

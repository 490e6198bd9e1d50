//! Server configuration, read from the environment (and `.env` when present).

use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Filter directive for tracing (RUST_LOG)
    pub log_level: String,
    /// Radius used when a nearby search does not give one
    pub nearby_radius_meters: f64,
    /// Currency stamped on recorded payments
    pub currency: String,
    /// Load the demo fleet and demo user at startup
    pub seed_demo_fleet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            nearby_radius_meters: 1000.0,
            currency: "USD".to_string(),
            seed_demo_fleet: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let host = lookup("HOST").unwrap_or(defaults.host);

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => defaults.port,
        };

        let log_level = lookup("RUST_LOG").unwrap_or(defaults.log_level);

        let nearby_radius_meters = match lookup("NEARBY_RADIUS_METERS") {
            Some(raw) => match raw.parse::<f64>() {
                Ok(r) if r.is_finite() && r >= 0.0 => r,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "NEARBY_RADIUS_METERS",
                        value: raw,
                    })
                }
            },
            None => defaults.nearby_radius_meters,
        };

        let currency = lookup("CURRENCY").unwrap_or(defaults.currency);

        let seed_demo_fleet = match lookup("SEED_DEMO_FLEET") {
            Some(raw) => match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "SEED_DEMO_FLEET",
                        value: raw,
                    })
                }
            },
            None => defaults.seed_demo_fleet,
        };

        Ok(Config {
            host,
            port,
            log_level,
            nearby_radius_meters,
            currency,
            seed_demo_fleet,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.nearby_radius_meters, 1000.0);
        assert!(config.seed_demo_fleet);
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "3001"),
            ("NEARBY_RADIUS_METERS", "250"),
            ("CURRENCY", "EUR"),
            ("SEED_DEMO_FLEET", "false"),
        ]))
        .unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.nearby_radius_meters, 250.0);
        assert_eq!(config.currency, "EUR");
        assert!(!config.seed_demo_fleet);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("PORT", "eighty")])),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("NEARBY_RADIUS_METERS", "-5")])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}

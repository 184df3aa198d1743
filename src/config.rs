use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub store_url: String,
    pub store_token: String,
    pub store_timeout_secs: u64,
    pub league: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let store_url = env_map
            .get("STORE_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("STORE_URL".to_string()))?;

        let store_token = env_map
            .get("STORE_TOKEN")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("STORE_TOKEN".to_string()))?;

        let store_timeout_secs = env_map
            .get("STORE_TIMEOUT_SECS")
            .map(|s| s.as_str())
            .unwrap_or("30")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "STORE_TIMEOUT_SECS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let league = env_map
            .get("LEAGUE")
            .cloned()
            .unwrap_or_else(|| "league".to_string());

        Ok(Config {
            store_url,
            store_token,
            store_timeout_secs,
            league,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(
            "STORE_URL".to_string(),
            "https://store.example.invalid".to_string(),
        );
        map.insert("STORE_TOKEN".to_string(), "sekrit".to_string());
        map
    }

    #[test]
    fn test_missing_store_url() {
        let mut env_map = setup_required_env();
        env_map.remove("STORE_URL");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "STORE_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_store_token() {
        let mut env_map = setup_required_env();
        env_map.remove("STORE_TOKEN");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "STORE_TOKEN"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_timeout() {
        let mut env_map = setup_required_env();
        env_map.insert("STORE_TIMEOUT_SECS".to_string(), "soon".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "STORE_TIMEOUT_SECS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.store_timeout_secs, 30);
        assert_eq!(config.league, "league");
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

const CONFIG_FILE: &str = "flightboard.toml";
const CONFIG_ENV: &str = "FLIGHTBOARD_CONFIG";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    /// Load the demo airports, airlines, planes and flights into an empty database
    pub seed_demo_data: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:18080".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("flights.db"),
            max_connections: 5,
            seed_demo_data: true,
        }
    }
}

fn config_path() -> PathBuf {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().unwrap_or_default().join(CONFIG_FILE),
    }
}

/// Read the config file, falling back to defaults when it is missing or broken.
pub fn load_config() -> AppConfig {
    let path = config_path();
    if path.exists() {
        match fs::read_to_string(&path) {
            Ok(contents) => match parse_config(&contents) {
                Ok(config) => {
                    info!("Loaded config from {:?}", path);
                    return config;
                }
                Err(e) => {
                    warn!("Failed to parse config: {}, using defaults", e);
                }
            },
            Err(e) => {
                warn!("Failed to read config: {}, using defaults", e);
            }
        }
    } else {
        info!("No config at {:?}, using defaults", path);
    }

    AppConfig::default()
}

pub fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        assert_eq!(parse_config("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = parse_config(
            r#"
            [database]
            path = "/var/lib/flightboard/board.db"
            seed_demo_data = false
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0:18080");
        assert_eq!(config.database.path, PathBuf::from("/var/lib/flightboard/board.db"));
        assert_eq!(config.database.max_connections, 5);
        assert!(!config.database.seed_demo_data);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(parse_config("[server\nbind_address = 3").is_err());
        assert!(parse_config("[database]\nmax_connections = \"many\"").is_err());
    }
}

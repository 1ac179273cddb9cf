//! Configuration management for the Verse Notes server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub lexicon: LexiconConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `index.html` and the `/static` assets
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LexiconConfig {
    /// Blue Letter Bible site root
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                static_dir: PathBuf::from("./static"),
            },
            database: DatabaseConfig {
                url: "sqlite:./bible_app.db".to_string(),
                max_connections: 5,
            },
            lexicon: LexiconConfig {
                base_url: "https://www.blueletterbible.org".to_string(),
                timeout_secs: 15,
            },
        }
    }
}

impl Config {
    /// Read the environment, falling back to defaults for anything unset or unparsable
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT").unwrap_or(defaults.server.port),
                static_dir: env::var("STATIC_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.server.static_dir),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or(defaults.database.max_connections),
            },
            lexicon: LexiconConfig {
                base_url: env::var("LEXICON_BASE_URL").unwrap_or(defaults.lexicon.base_url),
                timeout_secs: parse_var("LEXICON_TIMEOUT_SECS")
                    .unwrap_or(defaults.lexicon.timeout_secs),
            },
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::seed::DefaultBible;

/// Optional settings file looked up inside the data directory.
pub const CONFIG_FILE_NAME: &str = "lectern.toml";

const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60 * 24;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// CSV corpus. Defaults to `scripture.csv` inside the data directory.
    pub scripture_path: Option<PathBuf>,
    /// Lifetime of access tokens issued at register/login.
    pub token_ttl_minutes: i64,
    pub default_bible: DefaultBible,
}

/// Shape of `lectern.toml`. Every key is optional; unset keys keep defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub scripture_path: Option<PathBuf>,
    pub token_ttl_minutes: Option<i64>,
    pub default_bible_name: Option<String>,
    pub default_bible_language: Option<String>,
}

impl ServerConfig {
    /// Defaults for `data_dir`, overlaid with `lectern.toml` when present.
    pub fn load(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config = Self {
            data_dir: data_dir.into(),
            ..Self::default()
        };

        let path = config.data_dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            let file = FileConfig::read(&path)?;
            config.apply(file)?;
            tracing::info!("Loaded configuration from {}", path.display());
        }

        Ok(config)
    }

    pub fn apply(&mut self, file: FileConfig) -> Result<()> {
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(path) = file.scripture_path {
            self.scripture_path = Some(path);
        }
        if let Some(ttl) = file.token_ttl_minutes {
            if ttl <= 0 {
                return Err(Error::Config(
                    "token_ttl_minutes must be positive".to_string(),
                ));
            }
            self.token_ttl_minutes = ttl;
        }
        if let Some(name) = file.default_bible_name {
            self.default_bible.name = name;
        }
        if let Some(language) = file.default_bible_language {
            self.default_bible.language = language;
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("lectern.db")
    }

    #[must_use]
    pub fn scripture_path(&self) -> PathBuf {
        self.scripture_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("scripture.csv"))
    }
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            scripture_path: None,
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            default_bible: DefaultBible::default(),
        }
    }
}

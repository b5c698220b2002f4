use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

pub const DEFAULT_BIND: &str = "0.0.0.0:8763";
pub const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 10 << 20;
pub const DEFAULT_SHUTDOWN_GRACE_SECONDS: u64 = 10;
pub const DEFAULT_IMAGE_DIR: &str = "images";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FrameboxConfig {
    pub server: ServerSection,
    pub storage: StorageSection,
    pub selection: SelectionSection,
    /// Directory relative storage paths are resolved against. Set by the loader
    /// to the config file's parent directory.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl FrameboxConfig {
    pub fn resolve_path<P: AsRef<Path>>(&self, candidate: P) -> PathBuf {
        let path = candidate.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Image directory with relative paths resolved against the config location.
    pub fn image_dir(&self) -> PathBuf {
        self.resolve_path(&self.storage.image_dir)
    }

    pub fn bind_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        self.server.bind.parse()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    pub upload_limit_bytes: usize,
    pub shutdown_grace_seconds: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_BYTES,
            shutdown_grace_seconds: DEFAULT_SHUTDOWN_GRACE_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub image_dir: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectionSection {
    /// Fixed RNG seed. Every request then draws the same sequence.
    pub seed: Option<u64>,
}

pub fn load_framebox_config<P: AsRef<Path>>(path: P) -> Result<FrameboxConfig> {
    let path = path.as_ref();
    let mut config: FrameboxConfig = load_toml(path)?;
    config.base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    validate(&config, path)?;
    Ok(config)
}

fn validate(config: &FrameboxConfig, path: &Path) -> Result<()> {
    if config.bind_addr().is_err() {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: format!("server.bind {:?} is not a socket address", config.server.bind),
        });
    }
    if config.server.upload_limit_bytes == 0 {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: "server.upload_limit_bytes must be positive".to_string(),
        });
    }
    Ok(())
}

fn load_toml<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use aether_brain_client::connectivity::DEFAULT_POLL_INTERVAL;
use aether_brain_client::{Endpoint, EndpointError};
use log::{debug, info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

const APP_DIR: &str = "aether";
const CONFIG_FILE: &str = "config.json";

/// Type-safe configuration key that associates a key name with its value type
#[derive(Debug, Clone, Copy)]
pub struct ConfigKey<T> {
    name: &'static str,
    _phantom: PhantomData<T>,
}

impl<T> ConfigKey<T> {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            _phantom: PhantomData,
        }
    }

    pub fn key_name(&self) -> &'static str {
        self.name
    }
}

// ===== Brain Configuration =====

/// Where the Brain lives and how often to check on it (stored locally)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrainConfig {
    /// Base URL; also updated when discovery finds the Brain on another port
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Seconds between connectivity checks in `watch`
    #[serde(default = "default_poll_interval_secs", alias = "poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

impl ConfigKey<BrainConfig> {
    pub const BRAIN: Self = Self::new("brainConfig");
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No configuration directory available on this system")]
    NoConfigDir,
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ===== Type-Safe Config Store =====

pub trait ConfigStore {
    fn get<T: DeserializeOwned>(&self, key: &ConfigKey<T>) -> Option<T>;
    fn set<T: Serialize>(&self, key: &ConfigKey<T>, value: T) -> Result<(), ConfigError>;
    fn delete<T>(&self, key: &ConfigKey<T>) -> Result<(), ConfigError>;
}

/// Config store backed by a single JSON object on disk. Every write saves the
/// whole file.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    data: Mutex<Map<String, Value>>,
}

impl FileConfigStore {
    /// Load the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = load(&path);
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    /// Store at `<config dir>/aether/config.json`.
    pub fn open_default() -> Result<Self, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::open(dir.join(APP_DIR).join(CONFIG_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, data: &Map<String, Value>) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let contents = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;

        debug!("Saved config to {}", self.path.display());
        Ok(())
    }
}

fn load(path: &Path) -> Map<String, Value> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Map::new(),
        Err(e) => {
            warn!("Failed to read config {}: {}", path.display(), e);
            return Map::new();
        }
    };

    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            warn!("Ignoring corrupt config file {}", path.display());
            Map::new()
        }
    }
}

impl ConfigStore for FileConfigStore {
    fn get<T: DeserializeOwned>(&self, key: &ConfigKey<T>) -> Option<T> {
        self.data
            .lock()
            .unwrap()
            .get(key.key_name())
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    fn set<T: Serialize>(&self, key: &ConfigKey<T>, value: T) -> Result<(), ConfigError> {
        let val = serde_json::to_value(value)?;
        let mut data = self.data.lock().unwrap();
        data.insert(key.key_name().to_string(), val);
        self.save(&data)
    }

    fn delete<T>(&self, key: &ConfigKey<T>) -> Result<(), ConfigError> {
        let mut data = self.data.lock().unwrap();
        data.remove(key.key_name());
        self.save(&data)
    }
}

/// Pick the endpoint: explicit override, then the persisted one, then the
/// default. An invalid override is an error; an invalid persisted value is
/// skipped.
pub fn resolve_endpoint(
    override_url: Option<&str>,
    config: &BrainConfig,
) -> Result<Endpoint, EndpointError> {
    if let Some(url) = override_url {
        return Endpoint::parse(url);
    }

    if let Some(url) = &config.endpoint {
        match Endpoint::parse(url) {
            Ok(endpoint) => return Ok(endpoint),
            Err(e) => warn!("{}; using default endpoint", e),
        }
    }

    Ok(Endpoint::default())
}

/// Persist an endpoint adopted by discovery, keeping the other settings.
pub fn remember_endpoint<S: ConfigStore>(store: &S, endpoint: &Endpoint) -> Result<(), ConfigError> {
    let mut config = store.get(&ConfigKey::BRAIN).unwrap_or_default();
    let url = endpoint.to_string();
    if config.endpoint.as_deref() == Some(url.as_str()) {
        return Ok(());
    }

    info!("Remembering Brain endpoint {}", url);
    config.endpoint = Some(url);
    store.set(&ConfigKey::BRAIN, config)
}

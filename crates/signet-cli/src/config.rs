//! Keyring configuration for the CLI.
//!
//! Loaded from `signet.yaml` (or the path given by `--config` /
//! `SIGNET_CONFIG`):
//!
//! ```yaml
//! private_key_env: SIGNET_PRIVATE_KEY
//! private_key_file: keys/private.key
//! default_kid: v2
//! default_lifetime: 15m
//! audience: orders
//! keys:
//!   v1:
//!     hex: 3b6a27bcceb6a42d62a3a8d02a6f0d73653215771de243a63ac048a18b59da29
//!   v2:
//!     env: SIGNET_PUBLIC_KEY_V2
//!     file: keys/v2.pub
//! ```
//!
//! Relative file paths are resolved against the config file's directory.

use serde::{Deserialize, Serialize};
use signet::{KeyRing, PublicKey};
use signet_crypto::CryptoError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "signet.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid key '{key_id}': {source}")]
    Key {
        key_id: String,
        #[source]
        source: CryptoError,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Where to find one public key. The first source that yields a value wins,
/// in the order `hex`, `env`, `file`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeySource {
    /// Inline hex-encoded public key.
    #[serde(default)]
    pub hex: Option<String>,

    /// Environment variable holding the hex-encoded key.
    #[serde(default)]
    pub env: Option<String>,

    /// File holding the hex-encoded key.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl KeySource {
    pub fn resolve(&self) -> Result<Option<String>, std::io::Error> {
        if let Some(hex) = &self.hex {
            return Ok(Some(hex.trim().to_string()));
        }
        read_env_or_file(self.env.as_deref(), self.file.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignetConfig {
    /// Environment variable containing the private key (hex-encoded).
    #[serde(default)]
    pub private_key_env: Option<String>,

    /// Path to the private key file.
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,

    /// Key id stamped on minted tokens and used for tokens without a kid.
    #[serde(default)]
    pub default_kid: Option<String>,

    /// Lifetime of newly minted tokens (e.g. "15m", "1h", "7d").
    #[serde(default)]
    pub default_lifetime: Option<String>,

    /// Audience stamped on minted tokens and required when verifying.
    #[serde(default)]
    pub audience: Option<String>,

    /// Verification keys by kid.
    #[serde(default)]
    pub keys: BTreeMap<String, KeySource>,
}

impl SignetConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load a config file and anchor its relative paths at the file's directory.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        if let Some(file) = config.private_key_file.take() {
            config.private_key_file = Some(anchor(&base_dir, file));
        }
        for source in config.keys.values_mut() {
            if let Some(file) = source.file.take() {
                source.file = Some(anchor(&base_dir, file));
            }
        }

        tracing::debug!(path = %path.display(), keys = config.keys.len(), "loaded signet config");
        Ok(config)
    }

    /// Load `path` if given, otherwise `signet.yaml` when it exists.
    pub fn discover(path: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        match path {
            Some(path) => Self::load_with_context(path).map(Some),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load_with_context(default).map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Resolve the private key from environment or file.
    pub fn resolve_private_key(&self) -> Result<Option<String>, std::io::Error> {
        read_env_or_file(
            self.private_key_env.as_deref(),
            self.private_key_file.as_deref(),
        )
    }

    /// Parse `default_lifetime`, if set.
    pub fn default_lifetime(&self) -> Result<Option<chrono::Duration>, ConfigError> {
        self.default_lifetime
            .as_deref()
            .map(parse_duration)
            .transpose()
    }

    /// Build a key ring from `keys`. The `default_kid` entry also serves
    /// tokens that carry no kid.
    pub fn key_ring(&self) -> Result<KeyRing, ConfigError> {
        let mut ring = KeyRing::new();
        for (key_id, source) in &self.keys {
            let Some(hex) = source.resolve()? else {
                tracing::debug!(kid = %key_id, "no key material found, skipping");
                continue;
            };
            let key = PublicKey::from_hex(&hex).map_err(|source| ConfigError::Key {
                key_id: key_id.clone(),
                source,
            })?;
            ring.insert(key_id.clone(), key);
            if self.default_kid.as_deref() == Some(key_id.as_str()) {
                ring = ring.with_default(key);
            }
        }
        Ok(ring)
    }
}

fn anchor(base_dir: &Path, file: PathBuf) -> PathBuf {
    if file.is_absolute() {
        file
    } else {
        base_dir.join(file)
    }
}

fn read_env_or_file(
    env: Option<&str>,
    file: Option<&Path>,
) -> Result<Option<String>, std::io::Error> {
    // Environment wins over files.
    if let Some(var) = env {
        if let Ok(value) = std::env::var(var) {
            return Ok(Some(value.trim().to_string()));
        }
    }

    if let Some(path) = file {
        if path.exists() {
            let value = fs::read_to_string(path)?;
            return Ok(Some(value.trim().to_string()));
        }
    }

    Ok(None)
}

/// Parse a duration string like "15m", "24h", "7d" or "90s".
///
/// A bare number is taken as minutes.
pub fn parse_duration(s: &str) -> Result<chrono::Duration, ConfigError> {
    let s = s.trim().to_lowercase();
    let invalid = || ConfigError::Config(format!("invalid duration '{s}'"));

    let (digits, unit): (&str, fn(i64) -> Option<chrono::Duration>) =
        if let Some(d) = s.strip_suffix('d') {
            (d, chrono::Duration::try_days)
        } else if let Some(h) = s.strip_suffix('h') {
            (h, chrono::Duration::try_hours)
        } else if let Some(m) = s.strip_suffix('m') {
            (m, chrono::Duration::try_minutes)
        } else if let Some(sec) = s.strip_suffix('s') {
            (sec, chrono::Duration::try_seconds)
        } else {
            (s.as_str(), chrono::Duration::try_minutes)
        };

    let n: i64 = digits.trim().parse().map_err(|_| invalid())?;
    if n <= 0 {
        return Err(invalid());
    }
    unit(n).ok_or_else(invalid)
}

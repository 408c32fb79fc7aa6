//! Configuration loading and parsing.
//!
//! Parses `promptline.toml` (or an override path provided by the binary):
//!
//! ```toml
//! [input]
//! command_prefix = "/"
//! escape_timeout_ms = 50
//! max_escape_len = 32
//! bracketed_paste = true
//! max_paste_bytes = 1048576
//! paste_timeout_ms = 500
//!
//! [commands]
//! names = ["help", "history", "hello", "clear", "exit"]
//! ```
//!
//! Every field is optional and unknown fields are ignored. A missing file
//! silently yields defaults; an unreadable or malformed file yields defaults
//! plus a `warn` on target `config`.

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use std::{fs, io, path::Path, path::PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "promptline.toml";

/// Shortest escape buffer cap the decoder accepts.
pub const MIN_ESCAPE_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct InputConfig {
    #[serde(default = "InputConfig::default_command_prefix")]
    pub command_prefix: String,
    #[serde(default = "InputConfig::default_escape_timeout_ms")]
    pub escape_timeout_ms: u64,
    #[serde(default = "InputConfig::default_max_escape_len")]
    pub max_escape_len: usize,
    #[serde(default = "InputConfig::default_bracketed_paste")]
    pub bracketed_paste: bool,
    #[serde(default = "InputConfig::default_max_paste_bytes")]
    pub max_paste_bytes: usize,
    /// Idle time after which a paste missing its end marker is committed.
    #[serde(default = "InputConfig::default_paste_timeout_ms")]
    pub paste_timeout_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            command_prefix: Self::default_command_prefix(),
            escape_timeout_ms: Self::default_escape_timeout_ms(),
            max_escape_len: Self::default_max_escape_len(),
            bracketed_paste: Self::default_bracketed_paste(),
            max_paste_bytes: Self::default_max_paste_bytes(),
            paste_timeout_ms: Self::default_paste_timeout_ms(),
        }
    }
}

impl InputConfig {
    fn default_command_prefix() -> String {
        "/".to_string()
    }
    const fn default_escape_timeout_ms() -> u64 {
        50
    }
    const fn default_max_escape_len() -> usize {
        32
    }
    const fn default_bracketed_paste() -> bool {
        true
    }
    const fn default_max_paste_bytes() -> usize {
        1 << 20
    }
    const fn default_paste_timeout_ms() -> u64 {
        500
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CommandsConfig {
    #[serde(default = "CommandsConfig::default_names")]
    pub names: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            names: Self::default_names(),
        }
    }
}

impl CommandsConfig {
    fn default_names() -> Vec<String> {
        ["help", "history", "hello", "clear", "exit"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    // Prefer a local working directory file before the platform config dir.
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("promptline").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

/// Read and parse one file without any fallback.
pub fn parse_file(path: &Path) -> std::result::Result<(String, ConfigFile), ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file = toml::from_str::<ConfigFile>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((content, file))
}

/// Load configuration, falling back to defaults when the file is missing or broken.
pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    match parse_file(&path) {
        Ok((content, file)) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config {
                raw: Some(content),
                file,
            })
        }
        Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            info!(target: "config", path = %path.display(), "config_missing_using_defaults");
            Ok(Config::default())
        }
        Err(err) => {
            warn!(target: "config", error = %err, "config_invalid_using_defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// The overlay trigger. Only the first char of `command_prefix` is used;
    /// an empty value falls back to `/`.
    pub fn command_prefix(&self) -> char {
        let raw = &self.file.input.command_prefix;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            (Some(c), Some(_)) => {
                warn!(target: "config", prefix_len = raw.chars().count(), "command_prefix_truncated");
                c
            }
            (None, _) => {
                warn!(target: "config", "command_prefix_empty_using_default");
                '/'
            }
        }
    }

    /// Idle time after which a pending escape is flushed. Never zero.
    pub fn escape_timeout(&self) -> Duration {
        Duration::from_millis(self.file.input.escape_timeout_ms.max(1))
    }

    pub fn max_escape_len(&self) -> usize {
        let raw = self.file.input.max_escape_len;
        if raw < MIN_ESCAPE_LEN {
            info!(target: "config", raw, clamped = MIN_ESCAPE_LEN, "max_escape_len_clamped");
            return MIN_ESCAPE_LEN;
        }
        raw
    }

    pub fn max_paste_bytes(&self) -> usize {
        self.file.input.max_paste_bytes.max(1)
    }

    /// Never shorter than the escape timeout.
    pub fn paste_timeout(&self) -> Duration {
        Duration::from_millis(self.file.input.paste_timeout_ms).max(self.escape_timeout())
    }

    pub fn bracketed_paste(&self) -> bool {
        self.file.input.bracketed_paste
    }

    pub fn command_names(&self) -> &[String] {
        &self.file.commands.names
    }
}

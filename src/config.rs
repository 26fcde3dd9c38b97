//! User settings, read from a JSON file.
//!
//! Every field has a default, so a missing file or a partial one is fine.

use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::abs::{DEFAULT_INFO_LOG_LIMIT, ShaderOptions, UniformPolicy};

/// Environment variable that overrides the settings file location.
pub const CONFIG_ENV: &str = "GLSTEPS_CONFIG";

const SOURCE_ASSET_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub resizable: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "OpenGL Tutorial".to_string(),
            width: 800,
            height: 600,
            vsync: true,
            resizable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderSettings {
    /// Maximum bytes of a compile or link log kept in errors.
    pub info_log_limit: usize,
    /// Report writes to uniforms the program doesn't have as errors.
    pub strict_uniforms: bool,
}

impl Default for ShaderSettings {
    fn default() -> Self {
        Self {
            info_log_limit: DEFAULT_INFO_LOG_LIMIT,
            strict_uniforms: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window: WindowSettings,
    pub clear_color: [f32; 4],
    pub wireframe: bool,
    /// Directory that shader and texture paths are relative to.
    pub asset_dir: PathBuf,
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
    pub shader: ShaderSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            clear_color: [0.2, 0.3, 0.3, 1.0],
            wireframe: false,
            asset_dir: default_asset_dir(),
            log_level: "info".to_string(),
            shader: ShaderSettings::default(),
        }
    }
}

/// `assets/` next to the executable when it exists, otherwise the source checkout's.
fn default_asset_dir() -> PathBuf {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| Some(exe.parent()?.join("assets")));
    pick_asset_dir(beside_exe, PathBuf::from(SOURCE_ASSET_DIR))
}

fn pick_asset_dir(beside_exe: Option<PathBuf>, source: PathBuf) -> PathBuf {
    match beside_exe {
        Some(dir) if dir.is_dir() => dir,
        _ => source,
    }
}

impl Settings {
    /// Reads settings from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the file named by `GLSTEPS_CONFIG`, or the default location. A missing file
    /// yields the defaults.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::default_path(),
        };
        match path {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/glsteps/settings.json`, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("glsteps").join("settings.json"))
    }

    pub fn shader_options(&self) -> ShaderOptions {
        ShaderOptions {
            info_log_limit: self.shader.info_log_limit,
            uniform_policy: if self.shader.strict_uniforms {
                UniformPolicy::Strict
            } else {
                UniformPolicy::Ignore
            },
        }
    }

    /// Parsed log level. Unknown names fall back to `info`.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    pub fn asset_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.asset_dir.join(relative)
    }
}

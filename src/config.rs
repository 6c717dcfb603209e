//! Configuration for the semantic tracking session.
//!
//! Layered with figment:
//! - Default values
//! - `.cdk/settings.toml`, found by walking up from the working directory
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CDK_` and use double
//! underscores to separate nested levels:
//! - `CDK_TIMING__REPARSE_DELAY_MS=100` sets `timing.reparse_delay_ms`
//! - `CDK_LANGUAGES__OBJC=false` sets `languages.objc`
//! - `CDK_DIAGNOSTICS__MARKERS=false` sets `diagnostics.markers`

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::document::Language;
use crate::error::{CdkError, CdkResult};

/// Directory holding the settings file.
pub const CONFIG_DIR: &str = ".cdk";
pub const CONFIG_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub timing: TimingConfig,

    /// Which host languages are tracked
    #[serde(default)]
    pub languages: LanguagesConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Debounce and polling intervals, in milliseconds.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TimingConfig {
    /// Quiet period after an edit before the buffer is reparsed
    #[serde(default = "default_reparse_delay_ms")]
    pub reparse_delay_ms: u64,

    /// Window in which highlight requests are merged
    #[serde(default = "default_highlight_delay_ms")]
    pub highlight_delay_ms: u64,

    /// Event loop tick used to fire due timers
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LanguagesConfig {
    #[serde(default = "default_true")]
    pub c: bool,
    #[serde(default = "default_true")]
    pub cpp: bool,
    #[serde(default = "default_true")]
    pub objc: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DiagnosticsConfig {
    /// Underline diagnostic ranges
    #[serde(default = "default_true")]
    pub indicators: bool,

    /// Mark diagnostic lines in the margin
    #[serde(default = "default_true")]
    pub markers: bool,
}

/// Log levels: a default plus per-module overrides.
///
/// ```toml
/// [logging]
/// default = "warn"
///
/// [logging.modules]
/// session = "debug"
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,

    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_reparse_delay_ms() -> u64 {
    250
}
fn default_highlight_delay_ms() -> u64 {
    500
}
fn default_tick_ms() -> u64 {
    50
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            timing: TimingConfig::default(),
            languages: LanguagesConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reparse_delay_ms: default_reparse_delay_ms(),
            highlight_delay_ms: default_highlight_delay_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl TimingConfig {
    pub fn reparse_delay(&self) -> Duration {
        Duration::from_millis(self.reparse_delay_ms)
    }

    pub fn highlight_delay(&self) -> Duration {
        Duration::from_millis(self.highlight_delay_ms)
    }

    /// Never zero; tokio intervals reject a zero period.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            c: true,
            cpp: true,
            objc: true,
        }
    }
}

impl LanguagesConfig {
    pub fn is_supported(&self, language: &Language) -> bool {
        match language {
            Language::C => self.c,
            Language::Cpp => self.cpp,
            Language::ObjectiveC => self.objc,
            Language::Other(_) => false,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            indicators: true,
            markers: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honoring `CDK_` overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nesting; single underscores stay
            // part of the field name.
            .merge(
                Env::prefixed("CDK_")
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
            .map_err(Box::new)
    }

    /// Find `.cdk/settings.toml` in the current directory or an ancestor
    fn find_workspace_config() -> Option<PathBuf> {
        let root = Self::workspace_root()?;
        Some(root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// The nearest ancestor of the working directory containing `.cdk`
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> CdkResult<()> {
        let path = path.as_ref();
        let parent = path
            .parent()
            .ok_or_else(|| CdkError::Config(format!("invalid path '{}'", path.display())))?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Write default settings under `dir`.
    pub fn init_config_file_in(dir: &Path, force: bool) -> CdkResult<PathBuf> {
        let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err(CdkError::Config(
                "Configuration file already exists. Use --force to overwrite".to_string(),
            ));
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }

    /// Write default settings under the working directory
    pub fn init_config_file(force: bool) -> CdkResult<PathBuf> {
        let current = std::env::current_dir()?;
        Self::init_config_file_in(&current, force)
    }
}

/// Configuration management for EdX
///
/// EdX stores configuration in ~/.edx/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = r#"# EdX Configuration File
# See 'edx --config-path' for this file's location

[editor]
# Command prompt string (default: "*"); shown when enabled with -p or P
#prompt = "*"

# Number of lines the z command scrolls by default (default: 22)
#scroll_lines = 22

# Print full error messages instead of the terse ? (default: false)
#verbose_errors = false

[logging]
# Write debug logs to ~/.edx/edx.log (default: false)
#debug = false
"#;

/// EdX configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Editor settings
    #[serde(default)]
    pub editor: EditorConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Command prompt string
    #[serde(default = "default_prompt")]
    pub prompt: Option<String>,

    /// Default z scroll window
    #[serde(default = "default_scroll_lines")]
    pub scroll_lines: Option<usize>,

    /// Verbose error explanations at startup
    #[serde(default = "default_verbose_errors")]
    pub verbose_errors: Option<bool>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            scroll_lines: default_scroll_lines(),
            verbose_errors: default_verbose_errors(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Debug logging to the log file
    #[serde(default = "default_debug")]
    pub debug: Option<bool>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: default_debug(),
        }
    }
}

// Default functions for serde
fn default_prompt() -> Option<String> {
    Some("*".to_string())
}
fn default_scroll_lines() -> Option<usize> {
    Some(22)
}
fn default_verbose_errors() -> Option<bool> {
    Some(false)
}
fn default_debug() -> Option<bool> {
    Some(false)
}

/// Get the configuration file path
pub fn config_file_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home_dir.join(".edx").join("config.toml"))
}

impl Config {
    /// Load the configuration, falling back to defaults when the file is
    /// absent. A malformed file is an error, not a silent default.
    pub fn load() -> Result<Self> {
        let path = config_file_path()?;
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the commented default template if no config file exists yet.
    pub fn ensure_default_file() -> Result<PathBuf> {
        let path = config_file_path()?;
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
            fs::write(&path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        }
        Ok(path)
    }
}

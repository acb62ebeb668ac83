/// Configuration management for repren
///
/// repren reads optional defaults from ~/.repren/config.toml. Command-line
/// switches are merged on top.
use crate::walker::{DEFAULT_EXCLUDE, compile_exclude};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// repren configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Pattern compilation settings
    #[serde(default)]
    pub patterns: PatternConfig,

    /// File handling settings
    #[serde(default)]
    pub files: FilesConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    #[serde(default)]
    pub literal: bool,
    #[serde(default)]
    pub word_breaks: bool,
    #[serde(default)]
    pub insensitive: bool,
    #[serde(default)]
    pub dotall: bool,
    #[serde(default)]
    pub preserve_case: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Base-name exclusion regex, anchored at the start
    #[serde(default = "default_exclude")]
    pub exclude: String,

    /// Transform whole files at once instead of line by line
    #[serde(default)]
    pub at_once: bool,

    /// Delete backups after a successful rewrite
    #[serde(default)]
    pub clean: bool,

    /// Overwrite an existing backup instead of suffixing a new one
    #[serde(default)]
    pub clobber_backups: bool,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            at_once: false,
            clean: false,
            clobber_backups: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level: error, warn, info, debug or trace
    #[serde(default = "default_level")]
    pub level: String,

    /// Also append log output to this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_file: None,
        }
    }
}

// Default functions for serde
fn default_exclude() -> String { DEFAULT_EXCLUDE.to_string() }
fn default_level() -> String { "info".to_string() }

/// Get the default configuration file path
pub fn config_file_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home_dir.join(".repren").join("config.toml"))
}

/// Get the default configuration file content with comments
fn get_default_config_content() -> &'static str {
    r#"# repren configuration file
#
# Values set here are defaults; command-line switches override them.

[patterns]
# Treat search patterns as literal text (same as --literal)
literal = false

# Only match at word boundaries (same as --word-breaks)
word_breaks = false

# Case-insensitive matching (same as --insensitive)
insensitive = false

# Let '.' match newlines (same as --dotall)
dotall = false

# Expand each pattern into lowerCamel, UpperCamel, lower_ and UPPER_ variants
preserve_case = false

[files]
# File and directory names matching this regex (at the start) are skipped
exclude = '\.'

# Transform whole files at once instead of line by line (same as --at-once)
at_once = false

# Delete .orig backups after a successful rewrite (same as --clean)
clean = false

# Overwrite an existing .orig instead of creating .orig.1, .orig.2, ...
clobber_backups = false

[logging]
# One of: error, warn, info, debug, trace
level = "info"

# Also append log output to a file
#log_file = "/tmp/repren.log"
"#
}

/// Write the commented default configuration file, refusing to overwrite
pub fn save_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config file already exists: {}", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    fs::write(path, get_default_config_content())
        .with_context(|| format!("Failed to write default config file: {}", path.display()))?;
    Ok(())
}

/// Load configuration from `path`. A missing file yields the defaults; a
/// malformed or invalid file is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    validate_config(&config)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    Ok(config)
}

/// Render the configuration as TOML
pub fn to_toml(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}

/// Validate configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    compile_exclude(&config.files.exclude)?;

    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        anyhow::bail!(
            "Invalid log level: {} (must be one of {})",
            config.logging.level,
            LOG_LEVELS.join(", ")
        );
    }

    Ok(())
}

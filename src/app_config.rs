//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use session_jar_core::JarConfig;
use session_jar_core::store::default_storage_root;

/// `key = value` file configuration for jar defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Storage root holding the account namespaces.
    pub storage_dir: Option<PathBuf>,
    /// HMAC key used to derive namespace directory names.
    pub namespace_key: Option<String>,
    /// Cookie-name prefix kept by `clear` without `--include-protected`.
    pub protected_prefix: Option<String>,
}

impl FileConfig {
    /// Validates config values.
    pub fn validate(&self) -> Result<()> {
        if self.namespace_key.as_deref().is_some_and(str::is_empty) {
            bail!("Invalid config value for `namespace_key`: must not be empty");
        }
        if self.protected_prefix.as_deref().is_some_and(str::is_empty) {
            bail!("Invalid config value for `protected_prefix`: must not be empty");
        }
        Ok(())
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    pub fn loaded_from_file(&self) -> bool {
        self.config.is_some()
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/session-jar/config.toml`
/// 2. `$HOME/.config/session-jar/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("session-jar")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("session-jar")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

/// Builds the jar configuration: CLI flag > config file > environment.
pub fn effective_jar_config(
    cli_storage_dir: Option<&Path>,
    file: Option<&FileConfig>,
) -> Result<JarConfig> {
    let explicit_root = cli_storage_dir
        .map(Path::to_path_buf)
        .or_else(|| file.and_then(|file| file.storage_dir.clone()));
    let root = match explicit_root {
        Some(root) => root,
        None => default_storage_root()?,
    };

    let mut config = JarConfig::from_env_with_root(root);
    if let Some(file) = file {
        if let Some(key) = &file.namespace_key {
            config.namespace_key.clone_from(key);
        }
        if let Some(prefix) = &file.protected_prefix {
            config.protected_prefix.clone_from(prefix);
        }
    }
    Ok(config)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let parsed = parse_string_literal(value)
            .with_context(|| format!("Invalid `{key}` value on line {}", line_index + 1))?;

        match key {
            "storage_dir" => cfg.storage_dir = Some(PathBuf::from(parsed)),
            "namespace_key" => cfg.namespace_key = Some(parsed),
            "protected_prefix" => cfg.protected_prefix = Some(parsed),
            unknown => {
                bail!(
                    "Unknown configuration key: '{}' on line {}",
                    unknown,
                    line_index + 1
                );
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

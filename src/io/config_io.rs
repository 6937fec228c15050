use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::{ClientConfig, ThemeVariant};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not parse config.toml: {0}")]
    DocumentError(#[from] toml_edit::TomlError),
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("no config directory: set TASKDECK_CONFIG, XDG_CONFIG_HOME or HOME")]
    NoConfigDir,
}

/// Where the config file lives: `$TASKDECK_CONFIG`, else
/// `$XDG_CONFIG_HOME/taskdeck/config.toml`, else `~/.config/taskdeck/config.toml`
pub fn config_path() -> Result<PathBuf, ConfigError> {
    resolve_config_path(|key| std::env::var(key).ok())
}

pub(crate) fn resolve_config_path(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<PathBuf, ConfigError> {
    let set = |key: &str| lookup(key).filter(|v| !v.is_empty());
    if let Some(path) = set("TASKDECK_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    let base = set("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| set("HOME").map(|home| PathBuf::from(home).join(".config")))
        .ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join("taskdeck").join("config.toml"))
}

/// Parse the config at `path`; a missing file yields defaults.
/// Environment overrides are not applied here.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(toml::from_str(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Read the config as a toml_edit document for round-trip-safe editing
pub fn read_document(path: &Path) -> Result<toml_edit::DocumentMut, ConfigError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text.parse()?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(toml_edit::DocumentMut::new()),
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Write the document back to disk, creating the parent directory if needed
pub fn write_document(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::WriteError {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, doc.to_string()).map_err(write_err)
}

/// Set `section.key` (or `ui.colors.<name>`) in the document.
///
/// The edited document must still parse as a valid config.
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    let parts: Vec<&str> = key.split('.').collect();
    match parts.as_slice() {
        ["server", "api_url"] => {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(invalid("expected an http:// or https:// URL"));
            }
        }
        ["server", "user_id" | "token"] | ["ui", "export_dir"] => {}
        ["ui", "theme"] => {
            toml::Value::String(value.to_string())
                .try_into::<ThemeVariant>()
                .map_err(|_| invalid("expected plain or neon"))?;
        }
        ["ui", "colors", name] if !name.is_empty() => {
            if !is_hex_color(value) {
                return Err(invalid("expected #RRGGBB"));
            }
        }
        _ => return Err(ConfigError::UnknownKey(key.to_string())),
    }

    let (section, rest) = (parts[0], &parts[1..]);
    ensure_table(doc.as_table_mut(), section);
    let mut table = &mut doc[section];
    for (i, part) in rest.iter().enumerate() {
        if i + 1 == rest.len() {
            table[*part] = toml_edit::value(value);
        } else {
            if let Some(t) = table.as_table_mut() {
                ensure_table(t, part);
            }
            table = &mut table[*part];
        }
    }
    toml::from_str::<ClientConfig>(&doc.to_string())?;
    Ok(())
}

fn ensure_table(table: &mut toml_edit::Table, key: &str) {
    if !table.contains_key(key) {
        table[key] = toml_edit::Item::Table(toml_edit::Table::new());
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the task service
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// User id used in `/api/{user_id}/...` paths
    #[serde(default)]
    pub user_id: String,
    /// Bearer token issued by the auth service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            api_url: default_api_url(),
            user_id: String::new(),
            token: None,
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

/// Visual variant of the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    #[default]
    Plain,
    Neon,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub theme: ThemeVariant,
    /// Directory that exports are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
    /// Color overrides by theme slot name, as `#RRGGBB`
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            theme: ThemeVariant::default(),
            export_dir: default_export_dir(),
            colors: HashMap::new(),
        }
    }
}

fn default_export_dir() -> String {
    ".".to_string()
}

impl ClientConfig {
    /// Apply `TASKDECK_API_URL`, `TASKDECK_USER` and `TASKDECK_TOKEN`
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(url) = non_empty("TASKDECK_API_URL") {
            self.server.api_url = url;
        }
        if let Some(user) = non_empty("TASKDECK_USER") {
            self.server.user_id = user;
        }
        if let Some(token) = non_empty("TASKDECK_TOKEN") {
            self.server.token = Some(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.api_url, "http://localhost:8000");
        assert_eq!(config.ui.theme, ThemeVariant::Plain);
        assert_eq!(config.ui.export_dir, ".");
    }

    #[test]
    fn test_parse_full_config() {
        let config: ClientConfig = toml::from_str(
            r##"[server]
api_url = "https://tasks.example.com"
user_id = "u-42"
token = "abc"

[ui]
theme = "neon"
export_dir = "/tmp/exports"

[ui.colors]
highlight = "#FF00FF"
"##,
        )
        .unwrap();
        assert_eq!(config.server.user_id, "u-42");
        assert_eq!(config.server.token.as_deref(), Some("abc"));
        assert_eq!(config.ui.theme, ThemeVariant::Neon);
        assert_eq!(config.ui.colors.get("highlight").unwrap(), "#FF00FF");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ClientConfig::default();
        config.apply_overrides(|key| match key {
            "TASKDECK_USER" => Some("env-user".into()),
            "TASKDECK_TOKEN" => Some("  ".into()),
            _ => None,
        });
        assert_eq!(config.server.user_id, "env-user");
        assert_eq!(config.server.token, None);
        assert_eq!(config.server.api_url, "http://localhost:8000");
    }
}

use crate::cli::commands::{ConfigAction, ConfigCmd};
use crate::io::config_io;
use crate::model::config::ClientConfig;

use super::{Session, print_json};

pub(super) fn cmd_config(cmd: ConfigCmd, session: &Session) -> anyhow::Result<()> {
    match cmd.action {
        ConfigAction::Show => {
            let shown = redacted(&session.config);
            if session.json {
                return print_json(&shown);
            }
            print!("{}", toml::to_string_pretty(&shown)?);
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let path = &session.config_path;
            let mut doc = config_io::read_document(path)?;
            config_io::set_value(&mut doc, &key, &value)?;
            config_io::write_document(path, &doc)?;
            tracing::info!(%key, path = %path.display(), "config updated");
            if session.json {
                return print_json(&serde_json::json!({ "key": key, "value": value }));
            }
            println!("{} = {:?}", key, value);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", session.config_path.display());
            Ok(())
        }
    }
}

/// Effective config with the token masked
fn redacted(config: &ClientConfig) -> ClientConfig {
    let mut shown = config.clone();
    if shown.server.token.is_some() {
        shown.server.token = Some("********".to_string());
    }
    shown
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::board::ColumnSpec;
use crate::store::ResourceKind;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub server: Option<ServerConfig>,
    pub user: Option<UserConfig>,
    pub board: Option<BoardConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    pub api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserConfig {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BoardConfig {
    pub resource: Option<ResourceKind>,
    pub columns: Option<Vec<ColumnSpec>>,
}

impl AppConfig {
    /// Workflow stages in board order. The first column doubles as the
    /// fallback bucket for items with an unknown status.
    pub fn columns(&self) -> Vec<ColumnSpec> {
        self.board
            .as_ref()
            .and_then(|b| b.columns.clone())
            .filter(|cols| !cols.is_empty())
            .unwrap_or_else(default_columns)
    }

    pub fn resource(&self) -> ResourceKind {
        self.board
            .as_ref()
            .and_then(|b| b.resource)
            .unwrap_or(ResourceKind::Failures)
    }

    pub fn user_id(&self) -> i64 {
        self.user.as_ref().map(|u| u.id).unwrap_or(0)
    }
}

pub fn default_columns() -> Vec<ColumnSpec> {
    [
        ("new", "New"),
        ("in-progress", "In Progress"),
        ("blocked", "Blocked"),
        ("resolved", "Resolved"),
    ]
    .iter()
    .map(|(id, title)| ColumnSpec {
        id: (*id).to_string(),
        title: (*title).to_string(),
    })
    .collect()
}

fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".triage")
        .join("config.toml")
}

pub fn load_config() -> Result<AppConfig> {
    read_config(&config_path())
}

fn read_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig =
        toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = read_config(Path::new("/nonexistent/triage/config.toml")).unwrap();
        assert!(config.server.is_none());
        assert_eq!(config.resource(), ResourceKind::Failures);
        assert_eq!(config.columns().first().unwrap().id, "new");
        assert_eq!(config.columns().len(), 4);
    }

    #[test]
    fn parses_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
base_url = "http://qa.internal/api"
api_token = "secret"

[user]
id = 7
name = "Dana"

[board]
resource = "test-cases"

[[board.columns]]
id = "todo"
title = "To Do"

[[board.columns]]
id = "done"
title = "Done"
"#
        )
        .unwrap();

        let config = read_config(file.path()).unwrap();
        assert_eq!(
            config.server.as_ref().unwrap().base_url,
            "http://qa.internal/api"
        );
        assert_eq!(config.user_id(), 7);
        assert_eq!(config.resource(), ResourceKind::TestCases);
        let columns = config.columns();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].id, "todo");
    }

    #[test]
    fn empty_column_list_falls_back_to_defaults() {
        let config: AppConfig = toml::from_str("[board]\ncolumns = []\n").unwrap();
        assert_eq!(config.columns().len(), 4);
    }
}

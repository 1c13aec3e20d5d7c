use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::session::Category;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub cooldowns: CooldownConfig,
    #[serde(default)]
    pub categories: CategoryConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

impl Config {
    /// Missing or malformed configuration is the one fatal startup class:
    /// running with undefined storage behavior is worse than not running.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let db = &self.database;
        if db.host.is_empty() || db.user.is_empty() || db.name.is_empty() {
            bail!("database credentials are not configured; set [database] host, user and name");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub name: String,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CooldownConfig {
    #[serde(default = "default_command_secs")]
    pub command_secs: u64,
    #[serde(default = "default_selection_secs")]
    pub selection_secs: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            command_secs: default_command_secs(),
            selection_secs: default_selection_secs(),
        }
    }
}

impl CooldownConfig {
    pub fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    pub fn selection(&self) -> Duration {
        Duration::from_secs(self.selection_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    #[serde(default = "default_true")]
    pub skins: bool,
    #[serde(default = "default_true")]
    pub knives: bool,
    #[serde(default = "default_true")]
    pub gloves: bool,
    #[serde(default = "default_true")]
    pub agents: bool,
    #[serde(default = "default_true")]
    pub music: bool,
    #[serde(default = "default_true")]
    pub pins: bool,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            skins: true,
            knives: true,
            gloves: true,
            agents: true,
            music: true,
            pins: true,
        }
    }
}

impl CategoryConfig {
    pub fn enabled(&self, category: Category) -> bool {
        match category {
            Category::Skins => self.skins,
            Category::Knives => self.knives,
            Category::Gloves => self.gloves,
            Category::Agents => self.agents,
            Category::Music => self.music,
            Category::Pins => self.pins,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_preview_secs")]
    pub duration_secs: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_secs: default_preview_secs(),
        }
    }
}

impl PreviewConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

fn default_db_port() -> u16 {
    3306
}

fn default_command_secs() -> u64 {
    30
}

fn default_selection_secs() -> u64 {
    5
}

fn default_preview_secs() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            [database]
            host = "localhost"
            user = "csloadout"
            name = "csloadout"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.cooldowns.command(), Duration::from_secs(30));
        assert_eq!(config.cooldowns.selection(), Duration::from_secs(5));
        assert!(config.categories.enabled(Category::Pins));
        assert!(config.preview.enabled);
        assert_eq!(
            config.database.url(),
            "mysql://csloadout:@localhost:3306/csloadout"
        );
    }

    #[test]
    fn flags_and_cooldowns_are_overridable() {
        let config: Config = toml::from_str(
            r#"
            [database]
            host = "db.example.net"
            user = "u"
            password = "p"
            name = "skins"

            [cooldowns]
            command_secs = 60
            selection_secs = 3

            [categories]
            music = false
            "#,
        )
        .unwrap();
        assert_eq!(config.cooldowns.command(), Duration::from_secs(60));
        assert!(!config.categories.enabled(Category::Music));
        assert!(config.categories.enabled(Category::Skins));
    }

    #[test]
    fn missing_credentials_fail_validation() {
        let config: Config = toml::from_str(
            r#"
            [database]
            host = ""
            user = "u"
            name = "skins"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}

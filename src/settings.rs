use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::cli::Cli;
use crate::feed::{DEFAULT_ATTEMPT_LIMIT, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
use crate::theme::ThemeVariant;

const APP_SENTINEL: &str = "wikifeed";
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(rename = "_app")]
    pub app: String,

    pub theme: Option<ThemeVariant>,
    pub language: Option<String>,
    pub batch_size: Option<usize>,
    pub attempt_limit: Option<u32>,
    pub require_thumbnail: Option<bool>,
    pub timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: APP_SENTINEL.to_string(),
            theme: None,
            language: None,
            batch_size: None,
            attempt_limit: None,
            require_thumbnail: None,
            timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Layers command-line flags over the file values.
    pub fn with_cli(mut self, cli: &Cli) -> Result<Self> {
        if cli.dark {
            self.theme = Some(ThemeVariant::Dark);
        } else if cli.light {
            self.theme = Some(ThemeVariant::Light);
        }
        if let Some(language) = &cli.language {
            self.language = Some(language.clone());
        }
        if let Some(batch_size) = cli.batch_size {
            self.batch_size = Some(batch_size);
        }
        if let Some(attempt_limit) = cli.attempt_limit {
            self.attempt_limit = Some(attempt_limit);
        }
        if cli.allow_missing_thumbnails {
            self.require_thumbnail = Some(false);
        }
        self.validate_values()?;
        Ok(self)
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn attempt_limit(&self) -> u32 {
        self.attempt_limit.unwrap_or(DEFAULT_ATTEMPT_LIMIT)
    }

    pub fn require_thumbnail(&self) -> bool {
        self.require_thumbnail.unwrap_or(true)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    fn validate(&self) -> Result<()> {
        if self.app != APP_SENTINEL {
            bail!(
                "Settings file appears to belong to another application (expected _app = '{}', found '{}')",
                APP_SENTINEL,
                self.app
            );
        }
        self.validate_values()
    }

    fn validate_values(&self) -> Result<()> {
        let batch_size = self.batch_size();
        if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
            bail!("batch_size must be between 1 and {MAX_BATCH_SIZE}, got {batch_size}");
        }
        if self.attempt_limit() == 0 {
            bail!("attempt_limit must be at least 1");
        }
        let language = self.language();
        if language.is_empty()
            || !language
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            bail!("language must be a wiki language code such as 'en' or 'zh-yue', got '{language}'");
        }
        if self.timeout_secs == Some(0) {
            bail!("timeout_secs must be at least 1");
        }
        Ok(())
    }
}

pub fn config_dir(custom: Option<&PathBuf>) -> Option<PathBuf> {
    custom
        .cloned()
        .or_else(|| dirs::home_dir().map(|p| p.join(".config").join("wikifeed")))
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("settings.toml")
}

pub fn log_dir(config_dir: &Path) -> PathBuf {
    config_dir.join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn load_missing_file_returns_default() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");

        let settings = Settings::load(&path).unwrap();

        assert_eq!(settings.app, "wikifeed");
        assert!(settings.theme.is_none());
        assert_eq!(settings.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(settings.attempt_limit(), DEFAULT_ATTEMPT_LIMIT);
        assert_eq!(settings.language(), "en");
        assert!(settings.require_thumbnail());
        assert_eq!(settings.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn load_valid_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");

        fs::write(
            &path,
            "_app = \"wikifeed\"\ntheme = \"light\"\nlanguage = \"de\"\nbatch_size = 5\nrequire_thumbnail = false\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();

        assert_eq!(settings.theme, Some(ThemeVariant::Light));
        assert_eq!(settings.language(), "de");
        assert_eq!(settings.batch_size(), 5);
        assert!(!settings.require_thumbnail());
    }

    #[test]
    fn wrong_sentinel_returns_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");

        fs::write(&path, "_app = \"other-app\"\n").unwrap();

        let result = Settings::load(&path);

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("another application"));
    }

    #[test]
    fn oversized_batch_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");

        fs::write(&path, "_app = \"wikifeed\"\nbatch_size = 50\n").unwrap();

        let err = Settings::load(&path).unwrap_err().to_string();
        assert!(err.contains("batch_size"));
    }

    #[test]
    fn zero_attempt_limit_is_rejected() {
        let settings = Settings {
            attempt_limit: Some(0),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn bad_language_is_rejected() {
        let settings = Settings {
            language: Some("en.wikipedia.org/evil".to_string()),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn cli_overrides_file_values() {
        let settings = Settings {
            theme: Some(ThemeVariant::Light),
            batch_size: Some(5),
            language: Some("fr".to_string()),
            ..Default::default()
        };
        let cli = Cli::parse_from(["wikifeed", "--dark", "--batch-size", "12"]);

        let merged = settings.with_cli(&cli).unwrap();

        assert_eq!(merged.theme, Some(ThemeVariant::Dark));
        assert_eq!(merged.batch_size(), 12);
        assert_eq!(merged.language(), "fr");
    }

    #[test]
    fn cli_values_are_validated() {
        let cli = Cli::parse_from(["wikifeed", "--attempt-limit", "0"]);
        assert!(Settings::default().with_cli(&cli).is_err());
    }

    #[test]
    fn config_dir_uses_custom_when_provided() {
        let custom = PathBuf::from("/custom/path");
        let result = config_dir(Some(&custom));
        assert_eq!(result, Some(PathBuf::from("/custom/path")));
    }

    #[test]
    fn config_dir_falls_back_to_default() {
        let result = config_dir(None);
        assert!(result.is_some());
        assert!(result.unwrap().ends_with("wikifeed"));
    }
}

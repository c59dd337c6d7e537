use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// AI監査はバックエンド側で数十秒かかるため、これより短いタイムアウトは使わない
pub const MIN_TIMEOUT_SECONDS: u64 = 60;

const API_URL_ENV: &str = "RECEIPT_AUDIT_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub timeout_seconds: u64,
    /// レポートの保存先
    pub output_dir: PathBuf,
    /// プレビューの最大辺（px）
    pub preview_max_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AuditError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("receipt-audit").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            api_url: "http://localhost:8000".into(),
            timeout_seconds: 120,
            output_dir: PathBuf::from("."),
            preview_max_size: 320,
        }
    }

    /// バックエンドURL（環境変数を優先）
    pub fn api_url(&self) -> String {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => self.api_url.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        if self.timeout_seconds < MIN_TIMEOUT_SECONDS {
            warn!(
                configured = self.timeout_seconds,
                minimum = MIN_TIMEOUT_SECONDS,
                "タイムアウトが短すぎるため最小値を使用"
            );
            return Duration::from_secs(MIN_TIMEOUT_SECONDS);
        }
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn set_api_url(&mut self, url: String) -> Result<()> {
        let url = url.trim().trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AuditError::Config(format!("URLが不正です: {}", url)));
        }
        self.api_url = url;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.preview_max_size, 320);
    }

    #[test]
    fn test_timeout_floor() {
        let config = Config {
            timeout_seconds: 10,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(MIN_TIMEOUT_SECONDS));
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"api_url": "http://audit.local"}"#).unwrap();
        assert_eq!(config.api_url, "http://audit.local");
        assert_eq!(config.timeout_seconds, 120);
    }
}

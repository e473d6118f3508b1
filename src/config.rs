use crate::error::{LaundryError, Result};
use laundry_advisor_common::TransitionDelays;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// バックエンドURLの環境変数名
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: Option<String>,
    /// リクエストタイムアウト（未指定ならHTTPクライアントの既定値）
    pub timeout_seconds: Option<u64>,
    pub success_delay_ms: u64,
    pub invalid_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: None,
            timeout_seconds: None,
            success_delay_ms: TransitionDelays::DEFAULT_SUCCESS_MS,
            invalid_delay_ms: TransitionDelays::DEFAULT_INVALID_MS,
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数（.env含む）で上書き
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Self::load_file()?;
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            config.apply_env_backend_url(url);
        }
        Ok(config)
    }

    /// 設定ファイルが壊れていても既定値で続行する読み込み
    ///
    /// `config` コマンドで壊れた設定を上書きできるようにするため
    pub fn load_lenient() -> Self {
        dotenv::dotenv().ok();

        let mut config = Self::config_path()
            .and_then(|path| {
                if path.exists() {
                    Ok(Self::from_json_or_default(&std::fs::read_to_string(&path)?))
                } else {
                    Ok(Self::default())
                }
            })
            .unwrap_or_else(|e| {
                warn!(error = %e, "設定ファイルを読み込めません。既定値を使用します");
                Self::default()
            });
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            config.apply_env_backend_url(url);
        }
        config
    }

    fn load_file() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// パースに失敗したら警告して既定値
    pub fn from_json_or_default(content: &str) -> Self {
        Self::from_json(content).unwrap_or_else(|e| {
            warn!(error = %e, "設定ファイルが不正です。既定値を使用します");
            Self::default()
        })
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
            .ok_or_else(|| LaundryError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("laundry-advisor").join("config.json"))
    }

    fn apply_env_backend_url(&mut self, url: String) {
        if !url.trim().is_empty() {
            self.backend_url = Some(url);
        }
    }

    /// バックエンドURLを取得（起動時チェック用）
    pub fn backend_url(&self) -> Result<Url> {
        let raw = self
            .backend_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(LaundryError::MissingBackendUrl)?;

        parse_backend_url(raw)
    }

    pub fn set_backend_url(&mut self, url: String) -> Result<()> {
        parse_backend_url(&url)?;
        self.backend_url = Some(url);
        self.save()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.filter(|s| *s > 0).map(Duration::from_secs)
    }

    pub fn delays(&self) -> TransitionDelays {
        TransitionDelays::from_millis(self.success_delay_ms, self.invalid_delay_ms)
    }
}

pub fn parse_backend_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| LaundryError::InvalidBackendUrl(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(LaundryError::InvalidBackendUrl(format!(
            "{}: unsupported scheme {}",
            raw, other
        ))),
    }
}

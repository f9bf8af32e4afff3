//! # Configuration
//!
//! JSON設定ファイルの読み込み。ファイルがなければ全てデフォルト値を使う

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::entities::cleanup_rules::CleanupRules;

/// スプレッドシートIDを上書きする環境変数
pub const SPREADSHEET_ID_ENV: &str = "SOCPACK_SPREADSHEET_ID";

pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_KEY_PATH: &str = "service_account.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: 200 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// 書き込み先のスプレッドシートID（アップロード時に必須）
    pub spreadsheet_id: Option<String>,
    /// 0始まりのワークシート番号
    pub worksheet_index: usize,

    // Authentication
    pub service_account_key_path: String,

    /// ZIPの展開先
    pub work_dir: PathBuf,
    /// クリーンアップ済みCSVの保存先
    pub output_dir: PathBuf,

    pub server: ServerConfig,
    pub rules: CleanupRules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            worksheet_index: 0,
            service_account_key_path: DEFAULT_KEY_PATH.to_string(),
            work_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            server: ServerConfig::default(),
            rules: CleanupRules::default(),
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数の上書きを適用する
    pub fn load(path: &str) -> Result<Self> {
        let mut config = Self::load_file(Path::new(path))?;
        if let Ok(id) = std::env::var(SPREADSHEET_ID_ENV) {
            if !id.trim().is_empty() {
                config.spreadsheet_id = Some(id.trim().to_string());
            }
        }
        config
            .rules
            .validate()
            .context("Invalid cleanup rules in configuration")?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// アップロード用のスプレッドシートID
    pub fn require_spreadsheet_id(&self) -> Result<&str> {
        self.spreadsheet_id.as_deref().with_context(|| {
            format!(
                "spreadsheet_id is not configured (set it in the config file or {})",
                SPREADSHEET_ID_ENV
            )
        })
    }
}

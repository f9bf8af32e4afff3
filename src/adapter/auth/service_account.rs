//! Service Account Credentials
//!
//! サービスアカウント鍵の読み込み。ホスティング環境のシークレット、
//! 環境変数、ローカルファイルの順に探す

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// ホスティング環境で注入されるシークレット名
pub const HOSTED_SECRET_ENV: &str = "GCP_SERVICE_ACCOUNT";
/// パイプライン・ローカル実行用の環境変数
pub const SERVICE_ACCOUNT_JSON_ENV: &str = "GOOGLE_SERVICE_ACCOUNT_JSON";

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// サービスアカウント鍵（Google発行のJSON形式）
#[derive(Clone, Deserialize, Serialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

// private_key をログに出さない
impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        serde_json::from_str(json).map_err(|e| CredentialError::Malformed(e.to_string()))
    }
}

/// 鍵がどこから読み込まれたか
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    HostedSecret,
    EnvironmentJson,
    KeyFile(String),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::HostedSecret => write!(f, "hosted secret {}", HOSTED_SECRET_ENV),
            CredentialSource::EnvironmentJson => {
                write!(f, "environment variable {}", SERVICE_ACCOUNT_JSON_ENV)
            }
            CredentialSource::KeyFile(path) => write!(f, "key file {}", path),
        }
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(
        "no service account credentials found (checked {hosted}, {env} and {searched_file})",
        hosted = HOSTED_SECRET_ENV,
        env = SERVICE_ACCOUNT_JSON_ENV
    )]
    NotFound { searched_file: String },
    #[error("malformed service account JSON: {0}")]
    Malformed(String),
    #[error("failed to read key file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Expands tilde in path and returns the full path
pub fn expand_key_path(key_path: &str) -> String {
    shellexpand::tilde(key_path).to_string()
}

/// サービスアカウント鍵の解決
pub struct CredentialResolver {
    key_path: String,
}

impl CredentialResolver {
    pub fn new(key_path: impl Into<String>) -> Self {
        Self {
            key_path: key_path.into(),
        }
    }

    /// プロセスの環境変数を使って解決する
    pub fn resolve(&self) -> Result<(ServiceAccountKey, CredentialSource), CredentialError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// 鍵を解決する
    ///
    /// 1. `GCP_SERVICE_ACCOUNT`（ホスティング環境のシークレット）
    /// 2. `GOOGLE_SERVICE_ACCOUNT_JSON`
    /// 3. 鍵ファイル
    ///
    /// 1, 2 が壊れている場合は警告を出して次を試す
    pub fn resolve_with<F>(
        &self,
        lookup: F,
    ) -> Result<(ServiceAccountKey, CredentialSource), CredentialError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_sources = [
            (HOSTED_SECRET_ENV, CredentialSource::HostedSecret),
            (SERVICE_ACCOUNT_JSON_ENV, CredentialSource::EnvironmentJson),
        ];
        for (name, source) in env_sources {
            let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            match ServiceAccountKey::from_json(&value) {
                Ok(key) => {
                    info!("Using service account {} from {}", key.client_email, source);
                    return Ok((key, source));
                }
                Err(e) => warn!("Ignoring {}: {}", name, e),
            }
        }

        let path = expand_key_path(&self.key_path);
        if !Path::new(&path).exists() {
            return Err(CredentialError::NotFound {
                searched_file: path,
            });
        }
        let content = fs::read_to_string(&path).map_err(|source| CredentialError::Io {
            path: path.clone(),
            source,
        })?;
        let key = ServiceAccountKey::from_json(&content)?;
        info!("Using service account {} from {}", key.client_email, path);
        Ok((key, CredentialSource::KeyFile(path)))
    }
}

/// 環境変数のJSONを鍵ファイルとして書き出す（CIパイプライン用）
///
/// 内容はそのまま書き込むが、鍵として解釈できない値は拒否する
///
/// # Returns
///
/// 変数が未設定なら `false`
pub fn materialize_from_env(var: &str, key_path: &str) -> Result<bool> {
    materialize_with(std::env::var(var).ok(), var, key_path)
}

fn materialize_with(value: Option<String>, var: &str, key_path: &str) -> Result<bool> {
    let Some(json) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(false);
    };

    ServiceAccountKey::from_json(&json)
        .with_context(|| format!("{} is not a service account key", var))?;

    let path = expand_key_path(key_path);
    if let Some(parent) = Path::new(&path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create key directory")?;
        }
    }
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path))?;
    restrict_permissions(Path::new(&path))?;

    info!("Wrote {} from {}", path, var);
    Ok(true)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .context("Failed to restrict key file permissions")
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

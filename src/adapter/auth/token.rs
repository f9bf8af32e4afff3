//! OAuth2 Access Token
//!
//! サービスアカウント鍵でJWTに署名し、アクセストークンと交換する。
//! トークンは有効期限の5分前まで再利用する

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

#[cfg(test)]
use mockall::automock;

use super::service_account::ServiceAccountKey;

/// Sheets の読み書きに必要なスコープ
pub const SHEETS_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const TOKEN_LIFETIME_SECS: i64 = 60 * 60;
const REFRESH_SKEW_SECS: i64 = 5 * 60;

/// Source of bearer tokens for Google APIs
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(key: &ServiceAccountKey, scopes: &[&str], now: DateTime<Utc>) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: scopes.join(" "),
            aud: key.token_uri.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + TOKEN_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    TOKEN_LIFETIME_SECS
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Default)]
struct TokenState {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(exp) => {
                self.access_token.is_empty() || now + Duration::seconds(REFRESH_SKEW_SECS) >= exp
            }
        }
    }
}

/// JWT Bearer フローでトークンを取得するプロバイダ
pub struct ServiceAccountTokenProvider {
    key: ServiceAccountKey,
    scopes: Vec<String>,
    http: reqwest::Client,
    state: Mutex<TokenState>,
}

impl ServiceAccountTokenProvider {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Self {
        Self {
            key,
            scopes: SHEETS_SCOPES.iter().map(|s| s.to_string()).collect(),
            http,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// 署名済みJWT（assertion）を作る
    pub fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();
        let claims = JwtClaims::new(&self.key, &scopes, now);

        let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let encoding_key = jsonwebtoken::EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .context("Service account private_key is not a valid RSA PEM key")?;

        jsonwebtoken::encode(&header, &claims, &encoding_key).context("Failed to sign JWT")
    }

    async fn fetch_new_token(&self) -> Result<TokenResponse> {
        info!("Requesting access token for {}", self.key.client_email);

        let assertion = self.signed_assertion(Utc::now())?;
        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&params)
            .send()
            .await
            .context("Token request failed")?;

        let status = response.status();
        let body = response.text().await.context("Failed to read token response")?;
        if !status.is_success() {
            let detail = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(desc) => format!("{}: {}", e.error, desc),
                    None => e.error,
                })
                .unwrap_or(body);
            bail!("{} token exchange rejected: {}", status.as_u16(), detail);
        }

        serde_json::from_str(&body).context("Failed to parse token response")
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<String> {
        let now = Utc::now();
        let mut state = self.state.lock().await;

        if state.needs_refresh(now) {
            let response = self.fetch_new_token().await?;
            let expires_at = now + Duration::seconds(response.expires_in);
            state.access_token = response.access_token;
            state.expires_at = Some(expires_at);
            info!("New access token created; expires at {}", expires_at);
        }

        Ok(state.access_token.clone())
    }
}

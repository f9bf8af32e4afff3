//! Sheets Client Abstractions
//!
//! クライアントの抽象化と reqwest による実装

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use super::models::{
    ApiErrorResponse, SpreadsheetMetadata, UpdateValuesResponse, ValueRange,
};
use crate::adapter::auth::AccessTokenSource;
use crate::domain::repositories::sheet_repository::SheetUpdate;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Sheets API とトークン交換で共有する HTTP クライアント
pub fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")
}

/// Trait for the Sheets values operations used by the publisher
/// This enables mocking in tests while using the HTTP client in production
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Title of the worksheet at a 0-based position
    async fn worksheet_title(&self, spreadsheet_id: &str, index: usize) -> Result<String>;

    /// Clear all values in an A1 range
    async fn clear(&self, spreadsheet_id: &str, range: &str) -> Result<()>;

    /// Overwrite values starting at an A1 range
    async fn update(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<SheetUpdate>;
}

/// Sheets REST API v4 client
pub struct HttpSheetsClient {
    http: reqwest::Client,
    tokens: Arc<dyn AccessTokenSource>,
    base_url: Url,
}

impl HttpSheetsClient {
    pub fn new(http: reqwest::Client, tokens: Arc<dyn AccessTokenSource>) -> Result<Self> {
        Self::with_base_url(http, tokens, SHEETS_API_BASE)
    }

    pub fn with_base_url(
        http: reqwest::Client,
        tokens: Arc<dyn AccessTokenSource>,
        base_url: &str,
    ) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid Sheets API URL: {}", base_url))?;
        Ok(Self {
            http,
            tokens,
            base_url,
        })
    }

    /// `{base}/spreadsheets/{id}[/values/{range}{suffix}]`
    fn endpoint(&self, spreadsheet_id: &str, values_range: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("Sheets API URL cannot be a base: {}", self.base_url))?;
            segments.pop_if_empty().push("spreadsheets").push(spreadsheet_id);
            if let Some(range) = values_range {
                segments.push("values").push(range);
            }
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let token = self.tokens.access_token().await?;

        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.context("Sheets request failed")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read Sheets response")?;
        if !status.is_success() {
            bail!("{}", describe_failure(status, &text));
        }
        serde_json::from_str(&text).context("Failed to parse Sheets response")
    }
}

/// `"<code> <message>"` so that retry classification can see the status
fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(err) if !err.error.message.is_empty() => {
            format!("{} {}", status.as_u16(), err.error.message)
        }
        _ => format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown status")
        ),
    }
}

/// 0始まりの番号でワークシート名を選ぶ
fn select_title(metadata: SpreadsheetMetadata, index: usize) -> Result<String> {
    let count = metadata.sheets.len();
    let mut sheets = metadata.sheets;
    sheets.sort_by_key(|s| s.properties.index);
    sheets
        .into_iter()
        .nth(index)
        .map(|s| s.properties.title)
        .with_context(|| {
            format!(
                "Worksheet index {} is out of range (spreadsheet has {} worksheets)",
                index, count
            )
        })
}

#[async_trait]
impl SheetsApi for HttpSheetsClient {
    async fn worksheet_title(&self, spreadsheet_id: &str, index: usize) -> Result<String> {
        let mut url = self.endpoint(spreadsheet_id, None)?;
        url.query_pairs_mut().append_pair("fields", "sheets.properties");

        let metadata: SpreadsheetMetadata = self
            .send(Method::GET, url, None)
            .await
            .context("Sheets metadata request failed")?;
        select_title(metadata, index)
    }

    async fn clear(&self, spreadsheet_id: &str, range: &str) -> Result<()> {
        let url = self.endpoint(spreadsheet_id, Some(&format!("{}:clear", range)))?;
        let _: serde_json::Value = self
            .send(Method::POST, url, Some(serde_json::json!({})))
            .await
            .context("Sheets clear failed")?;
        Ok(())
    }

    async fn update(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<SheetUpdate> {
        let mut url = self.endpoint(spreadsheet_id, Some(range))?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = serde_json::to_value(ValueRange::rows(range, values))
            .context("Failed to serialize values")?;
        let response: UpdateValuesResponse = self
            .send(Method::PUT, url, Some(body))
            .await
            .context("Sheets update failed")?;

        Ok(SheetUpdate::new(
            response.updated_range,
            response.updated_rows,
            response.updated_cells,
        ))
    }
}

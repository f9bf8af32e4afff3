//! Google Sheet Repository Implementation
//!
//! SheetRepositoryのGoogle Sheets実装

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::adapter::auth::{AccessTokenSource, CredentialResolver, ServiceAccountTokenProvider};
use crate::adapter::config::Config;
use crate::adapter::sheets::client::{HttpSheetsClient, SheetsApi};
use crate::adapter::sheets::models::quote_sheet_title;
use crate::adapter::sheets::retry::with_retry;
use crate::domain::repositories::sheet_repository::{
    SheetRepository, SheetRepositoryFactory, SheetUpdate,
};

/// スプレッドシートの1ワークシート
///
/// ワークシート名は最初の呼び出しで一度だけ解決する
pub struct GoogleSheetRepository {
    api: Arc<dyn SheetsApi>,
    spreadsheet_id: String,
    worksheet_index: usize,
    title: OnceCell<String>,
}

impl GoogleSheetRepository {
    pub fn new(api: Arc<dyn SheetsApi>, spreadsheet_id: String, worksheet_index: usize) -> Self {
        Self {
            api,
            spreadsheet_id,
            worksheet_index,
            title: OnceCell::new(),
        }
    }

    async fn title(&self) -> Result<&str> {
        let title = self
            .title
            .get_or_try_init(|| async {
                let title = with_retry("Sheets metadata", || {
                    self.api
                        .worksheet_title(&self.spreadsheet_id, self.worksheet_index)
                })
                .await?;
                info!(
                    "Worksheet #{} of {} is '{}'",
                    self.worksheet_index, self.spreadsheet_id, title
                );
                Ok::<_, anyhow::Error>(title)
            })
            .await?;
        Ok(title.as_str())
    }
}

#[async_trait]
impl SheetRepository for GoogleSheetRepository {
    fn describe(&self) -> String {
        match self.title.get() {
            Some(title) => format!("worksheet '{}' of spreadsheet {}", title, self.spreadsheet_id),
            None => format!(
                "worksheet #{} of spreadsheet {}",
                self.worksheet_index, self.spreadsheet_id
            ),
        }
    }

    async fn clear(&self) -> Result<()> {
        let range = quote_sheet_title(self.title().await?);
        with_retry("Sheets clear", || self.api.clear(&self.spreadsheet_id, &range)).await
    }

    async fn update(&self, values: Vec<Vec<String>>) -> Result<SheetUpdate> {
        let range = format!("{}!A1", quote_sheet_title(self.title().await?));
        with_retry("Sheets update", || {
            self.api
                .update(&self.spreadsheet_id, &range, values.clone())
        })
        .await
    }
}

/// Production implementation of SheetRepositoryFactory
///
/// 認証情報は最初に成功した接続で確定し、以降のトークンはキャッシュを使う
pub struct GoogleSheetFactory {
    config: Config,
    http: reqwest::Client,
    tokens: OnceCell<Arc<dyn AccessTokenSource>>,
}

impl GoogleSheetFactory {
    pub fn new(config: Config, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            tokens: OnceCell::new(),
        }
    }

    async fn tokens(&self) -> Result<Arc<dyn AccessTokenSource>> {
        let tokens = self
            .tokens
            .get_or_try_init(|| async {
                let resolver = CredentialResolver::new(self.config.service_account_key_path.clone());
                let (key, source) = resolver.resolve()?;
                info!("Authenticating as {} ({})", key.client_email, source);
                let provider: Arc<dyn AccessTokenSource> =
                    Arc::new(ServiceAccountTokenProvider::new(key, self.http.clone()));
                Ok::<_, anyhow::Error>(provider)
            })
            .await?;
        Ok(Arc::clone(tokens))
    }
}

#[async_trait]
impl SheetRepositoryFactory for GoogleSheetFactory {
    async fn connect(&self) -> Result<Arc<dyn SheetRepository>> {
        let spreadsheet_id = self.config.require_spreadsheet_id()?.to_string();
        let tokens = self.tokens().await?;
        let client = HttpSheetsClient::new(self.http.clone(), tokens)?;
        Ok(Arc::new(GoogleSheetRepository::new(
            Arc::new(client),
            spreadsheet_id,
            self.config.worksheet_index,
        )))
    }
}

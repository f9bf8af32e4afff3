//! Sheets API Models
//!
//! Google Sheets REST API v4 のリクエスト・レスポンス

use serde::{Deserialize, Serialize};

/// `spreadsheets.values` の値範囲
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    pub major_dimension: String,
    pub values: Vec<Vec<String>>,
}

impl ValueRange {
    pub fn rows(range: impl Into<String>, values: Vec<Vec<String>>) -> Self {
        Self {
            range: range.into(),
            major_dimension: "ROWS".to_string(),
            values,
        }
    }
}

/// `spreadsheets.values.update` のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateValuesResponse {
    pub spreadsheet_id: String,
    pub updated_range: String,
    pub updated_rows: usize,
    pub updated_columns: usize,
    pub updated_cells: usize,
}

/// `spreadsheets.get?fields=sheets.properties` のレスポンス
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpreadsheetMetadata {
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
    pub index: usize,
}

/// Google API のエラーレスポンス
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// A1表記でシート名をクォートする
///
/// ```
/// use socpack::adapter::sheets::models::quote_sheet_title;
///
/// assert_eq!(quote_sheet_title("Sheet1"), "'Sheet1'");
/// assert_eq!(quote_sheet_title("Bob's data"), "'Bob''s data'");
/// ```
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

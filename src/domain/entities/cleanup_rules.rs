//! # CleanupRules Value Object
//!
//! CSVクリーンアップの規則（行フィルタ、ソート列、削除する列範囲）

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::column::{letter_to_index, ColumnError, ColumnRange};

/// 行フィルタ
///
/// 指定列の値が `value` と完全一致する行のみ残す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: String,
    pub value: String,
}

impl ColumnFilter {
    pub fn new(column: &str, value: &str) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// クリーンアップ規則
///
/// 列は全て列記号で指定する。デフォルト値はSOCパック出力の形式に合わせている
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupRules {
    /// 全て一致した行のみ残す
    pub filters: Vec<ColumnFilter>,
    /// マージ後のソート列
    pub sort_column: String,
    /// 削除する列範囲
    pub drop_ranges: Vec<ColumnRange>,
}

impl Default for CleanupRules {
    fn default() -> Self {
        Self {
            filters: vec![
                ColumnFilter::new("K", "Station"),
                ColumnFilter::new("M", "SOC 5"),
            ],
            sort_column: "X".to_string(),
            drop_ranges: vec![
                ColumnRange::new("C", "I"),
                ColumnRange::new("K", "M"),
                ColumnRange::new("O", "U"),
                ColumnRange::new("Y", "Z"),
                ColumnRange::new("AE", "AH"),
            ],
        }
    }
}

impl CleanupRules {
    /// 全ての列記号が正しいか検証する
    pub fn validate(&self) -> Result<(), ColumnError> {
        self.max_needed_index().map(|_| ())
    }

    /// 規則が参照する最大の列インデックス
    ///
    /// CSVはこのインデックスまで空の列でパディングされる
    pub fn max_needed_index(&self) -> Result<usize, ColumnError> {
        let mut max = letter_to_index(&self.sort_column)?;
        for filter in &self.filters {
            max = max.max(letter_to_index(&filter.column)?);
        }
        for range in &self.drop_ranges {
            // start も検証しておく
            letter_to_index(&range.start)?;
            max = max.max(range.end_index()?);
        }
        Ok(max)
    }

    /// 全列が欠損でも削除しない列（フィルタ列とソート列）
    pub fn keep_columns(&self) -> BTreeSet<String> {
        self.filters
            .iter()
            .map(|f| f.column.to_ascii_uppercase())
            .chain(std::iter::once(self.sort_column.to_ascii_uppercase()))
            .collect()
    }
}

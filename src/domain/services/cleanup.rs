//! # Cleanup Service
//!
//! 1ファイル分のCSVを列記号の表に変換し、行フィルタと列削除を適用する

use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::entities::cleanup_rules::CleanupRules;
use crate::domain::entities::column::{index_to_letter, ColumnError};
use crate::domain::entities::table::{Cell, LetterTable, RawCsv};

/// クリーンアップ時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleanupError {
    #[error("{source_file}: row {row} has {fields} fields, header has {expected}")]
    RowTooWide {
        source_file: String,
        row: usize,
        fields: usize,
        expected: usize,
    },
    #[error(transparent)]
    Column(#[from] ColumnError),
}

/// クリーンアップサービス
pub struct CleanupService;

impl CleanupService {
    /// CSVをクリーンアップする
    ///
    /// 1. ヘッダーより短い行は欠損値で埋める（長い行はエラー）
    /// 2. 規則が参照する最大列まで空の列でパディング
    /// 3. 列名を A, B, C, ... に置き換え、元のヘッダー名を記録
    /// 4. フィルタ列が全て一致する行のみ残す
    /// 5. 削除範囲の列を落とす
    pub fn clean(raw: RawCsv, rules: &CleanupRules) -> Result<LetterTable, CleanupError> {
        let max_needed = rules.max_needed_index()?;
        let width = raw.header.len().max(max_needed + 1);

        let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(raw.records.len());
        for (i, record) in raw.records.into_iter().enumerate() {
            if record.len() > raw.header.len() {
                return Err(CleanupError::RowTooWide {
                    source_file: raw.source.clone(),
                    // ヘッダーが1行目なのでデータは2行目から
                    row: i + 2,
                    fields: record.len(),
                    expected: raw.header.len(),
                });
            }
            let mut row: Vec<Cell> = record.into_iter().map(to_cell).collect();
            row.resize(width, None);
            rows.push(row);
        }

        let headers: Vec<String> = (0..width).map(index_to_letter).collect();
        let header_names: BTreeMap<String, String> = raw
            .header
            .into_iter()
            .enumerate()
            .map(|(i, name)| (index_to_letter(i), name))
            .collect();

        let mut table = LetterTable::new(headers, header_names, rows);

        let mut filters = Vec::with_capacity(rules.filters.len());
        for filter in &rules.filters {
            // パディング済みなので必ず存在する
            if let Some(pos) = table.column_position(&filter.column) {
                filters.push((pos, filter.value.as_str()));
            }
        }
        table.retain_rows(|row| {
            filters
                .iter()
                .all(|(pos, value)| row[*pos].as_deref() == Some(*value))
        });

        let mut drop_letters = Vec::new();
        for range in &rules.drop_ranges {
            drop_letters.extend(range.letters()?);
        }
        table.drop_columns(&drop_letters);

        Ok(table)
    }
}

/// 空欄のみを欠損値とする（`NA` や `null` は文字列のまま）
fn to_cell(value: String) -> Cell {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

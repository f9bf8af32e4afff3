//! # Merge Service
//!
//! クリーンアップ済みの表を1つにまとめ、ソートと空列の除去を行う

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::domain::entities::cleanup_rules::CleanupRules;
use crate::domain::entities::merged_table::MergedTable;
use crate::domain::entities::table::{Cell, LetterTable};

/// マージサービス
pub struct MergeService;

impl MergeService {
    /// 表をマージする
    ///
    /// 1. 行を連結（列は出現順の和集合、足りない列は欠損値）
    /// 2. 全セルが欠損の行を削除
    /// 3. ソート列がなければ追加
    /// 4. ソート列で安定ソート（欠損値は末尾）
    /// 5. 全て欠損の列を削除（フィルタ列・ソート列は残す）
    /// 6. 欠損値を空文字列に置換
    pub fn merge(tables: Vec<LetterTable>, rules: &CleanupRules) -> MergedTable {
        // ヘッダー名は最初にマッピングを持つ表のものを使う
        let header_names: BTreeMap<String, String> = tables
            .iter()
            .map(|t| t.header_names())
            .find(|names| !names.is_empty())
            .cloned()
            .unwrap_or_default();

        // 各表の列 → 結合後の列番号
        let mut letters: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let positions: Vec<Vec<usize>> = tables
            .iter()
            .map(|table| {
                table
                    .headers()
                    .iter()
                    .map(|header| {
                        *index.entry(header.clone()).or_insert_with(|| {
                            letters.push(header.clone());
                            letters.len() - 1
                        })
                    })
                    .collect()
            })
            .collect();

        let mut rows: Vec<Vec<Cell>> = Vec::new();
        for (table, positions) in tables.into_iter().zip(&positions) {
            for source in table.into_rows() {
                let mut row = vec![None; letters.len()];
                for (cell, &pos) in source.into_iter().zip(positions) {
                    row[pos] = cell;
                }
                rows.push(row);
            }
        }

        let mut merged = LetterTable::new(letters, BTreeMap::new(), rows);
        merged.retain_rows(|row| row.iter().any(Option::is_some));

        let sort_column = rules.sort_column.to_ascii_uppercase();
        let sort_pos = match merged.column_position(&sort_column) {
            Some(pos) => pos,
            None => {
                merged.push_empty_column(&sort_column);
                merged.headers().len() - 1
            }
        };

        let keep = rules.keep_columns();
        let empty_columns: Vec<String> = merged
            .headers()
            .iter()
            .enumerate()
            .filter(|(i, h)| !keep.contains(*h) && merged.is_column_empty(*i))
            .map(|(_, h)| h.clone())
            .collect();

        let letters_before_drop = merged.headers().to_vec();
        let rows = sort_rows(merged.into_rows(), sort_pos);

        let mut table = LetterTable::new(letters_before_drop, BTreeMap::new(), rows);
        table.drop_columns(&empty_columns);

        let letters = table.headers().to_vec();
        let rows = table
            .into_rows()
            .into_iter()
            .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
            .collect();

        MergedTable {
            letters,
            header_names,
            rows,
        }
    }
}

/// ソートキー
///
/// 列の型は列全体で1つに決める。値が全て数値なら数値列、1つでも数値でなければ文字列列
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
    Missing,
}

impl SortKey {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Missing, SortKey::Missing) => Ordering::Equal,
            (SortKey::Missing, _) => Ordering::Greater,
            (_, SortKey::Missing) => Ordering::Less,
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
        }
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// 列の値をソートキーにする
fn sort_keys(column: &[&Cell]) -> Vec<SortKey> {
    let numeric = column
        .iter()
        .filter_map(|cell| cell.as_deref())
        .all(|value| parse_number(value).is_some());

    column
        .iter()
        .map(|cell| match cell.as_deref() {
            None => SortKey::Missing,
            Some(value) if numeric => parse_number(value).map_or(SortKey::Missing, SortKey::Number),
            Some(value) => SortKey::Text(value.to_string()),
        })
        .collect()
}

/// ソート列で安定ソートする（欠損値は末尾）
fn sort_rows(rows: Vec<Vec<Cell>>, sort_pos: usize) -> Vec<Vec<Cell>> {
    let column: Vec<&Cell> = rows.iter().map(|row| &row[sort_pos]).collect();
    let keys = sort_keys(&column);

    let mut keyed: Vec<(SortKey, Vec<Cell>)> = keys.into_iter().zip(rows).collect();
    keyed.sort_by(|(a, _), (b, _)| a.compare(b));
    keyed.into_iter().map(|(_, row)| row).collect()
}

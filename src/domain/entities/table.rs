//! # LetterTable Entity
//!
//! 列記号でアドレス指定される表データ

use std::collections::BTreeMap;

/// 欠損値を `None` で表すセル
pub type Cell = Option<String>;

/// 読み込んだままのCSV
///
/// 1行目がヘッダー、残りがデータ行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCsv {
    /// 元ファイル名（ログ・エラー表示用）
    pub source: String,
    pub header: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl RawCsv {
    pub fn new(source: impl Into<String>, header: Vec<String>, records: Vec<Vec<String>>) -> Self {
        Self {
            source: source.into(),
            header,
            records,
        }
    }
}

/// 列記号で管理する表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LetterTable {
    headers: Vec<String>,
    header_names: BTreeMap<String, String>,
    rows: Vec<Vec<Cell>>,
}

impl LetterTable {
    /// 新しい表を作成
    ///
    /// 各行の長さは `headers` と一致している必要がある
    pub fn new(
        headers: Vec<String>,
        header_names: BTreeMap<String, String>,
        rows: Vec<Vec<Cell>>,
    ) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == headers.len()));
        Self {
            headers,
            header_names,
            rows,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// 列記号 → 元のCSVヘッダー名
    ///
    /// パディングで追加された列は含まれない
    pub fn header_names(&self) -> &BTreeMap<String, String> {
        &self.header_names
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Cell>> {
        self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_position(&self, letter: &str) -> Option<usize> {
        let letter = letter.to_ascii_uppercase();
        self.headers.iter().position(|h| *h == letter)
    }

    /// 条件を満たす行のみ残す
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Cell]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// 指定列を削除する。存在しない列は無視する
    ///
    /// # Returns
    ///
    /// 実際に削除した列の数
    pub fn drop_columns(&mut self, letters: &[String]) -> usize {
        let positions: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| letters.iter().any(|l| l.eq_ignore_ascii_case(h)))
            .map(|(i, _)| i)
            .collect();

        if positions.is_empty() {
            return 0;
        }

        let keep = |idx: &usize| !positions.contains(idx);
        self.headers = retain_indexed(std::mem::take(&mut self.headers), keep);
        for row in &mut self.rows {
            *row = retain_indexed(std::mem::take(row), keep);
        }
        positions.len()
    }

    /// 全て欠損値の列を末尾に追加
    pub fn push_empty_column(&mut self, letter: &str) {
        self.headers.push(letter.to_ascii_uppercase());
        for row in &mut self.rows {
            row.push(None);
        }
    }

    /// 列が全て欠損値かどうか
    pub fn is_column_empty(&self, position: usize) -> bool {
        self.rows.iter().all(|row| row[position].is_none())
    }

    /// 先頭 `n` 行
    pub fn preview(&self, n: usize) -> &[Vec<Cell>] {
        &self.rows[..n.min(self.rows.len())]
    }
}

fn retain_indexed<T>(items: Vec<T>, keep: impl Fn(&usize) -> bool) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep(i))
        .map(|(_, item)| item)
        .collect()
}

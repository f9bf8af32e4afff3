//! # MergedTable Value Object
//!
//! 全CSVをマージ・整形した結果。欠損値は空文字列に置換済み

use std::collections::BTreeMap;

/// マージ済みの表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedTable {
    /// 列記号
    pub letters: Vec<String>,
    /// 列記号 → 元のCSVヘッダー名
    pub header_names: BTreeMap<String, String>,
    pub rows: Vec<Vec<String>>,
}

impl MergedTable {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.letters.len()
    }

    /// シートに書き込むヘッダー行
    ///
    /// 元のヘッダー名があればそれを、なければ列記号を使う
    pub fn header_row(&self) -> Vec<String> {
        self.letters
            .iter()
            .map(|letter| {
                self.header_names
                    .get(letter)
                    .cloned()
                    .unwrap_or_else(|| letter.clone())
            })
            .collect()
    }

    /// ヘッダー行 + データ行
    pub fn to_values(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header_row())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    pub fn preview(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// 残った列の（列記号, 元ヘッダー名）の対応
    pub fn column_mapping(&self) -> Vec<(String, String)> {
        self.letters
            .iter()
            .filter_map(|letter| {
                self.header_names
                    .get(letter)
                    .map(|name| (letter.clone(), name.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MergedTable {
        MergedTable {
            letters: vec!["A".to_string(), "X".to_string(), "AI".to_string()],
            header_names: BTreeMap::from([
                ("A".to_string(), "Route".to_string()),
                ("X".to_string(), "ETA".to_string()),
            ]),
            rows: vec![
                vec!["r1".to_string(), "1".to_string(), String::new()],
                vec!["r2".to_string(), "2".to_string(), "x".to_string()],
            ],
        }
    }

    #[test]
    fn test_header_row_falls_back_to_letter() {
        assert_eq!(sample().header_row(), vec!["Route", "ETA", "AI"]);
    }

    #[test]
    fn test_to_values() {
        let values = sample().to_values();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0][0], "Route");
        assert_eq!(values[2], vec!["r2", "2", "x"]);
    }

    #[test]
    fn test_column_mapping_skips_unmapped() {
        let mapping = sample().column_mapping();
        assert_eq!(
            mapping,
            vec![
                ("A".to_string(), "Route".to_string()),
                ("X".to_string(), "ETA".to_string())
            ]
        );
    }

    #[test]
    fn test_empty() {
        let table = MergedTable::default();
        assert!(table.is_empty());
        assert_eq!(table.to_values(), vec![Vec::<String>::new()]);
    }
}

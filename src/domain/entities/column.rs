//! # Column Letters
//!
//! スプレッドシートの列記号（A, B, ..., Z, AA, ...）と0始まりインデックスの相互変換

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 列記号に関するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnError {
    #[error("invalid column letter: {0:?}")]
    InvalidLetter(String),
}

/// Convert Excel-style column letters (`A`, `K`, `AA`) to a 0-based index.
///
/// ```
/// use socpack::domain::entities::column::letter_to_index;
///
/// assert_eq!(letter_to_index("A").unwrap(), 0);
/// assert_eq!(letter_to_index("x").unwrap(), 23);
/// assert_eq!(letter_to_index("AE").unwrap(), 30);
/// assert!(letter_to_index("A1").is_err());
/// ```
pub fn letter_to_index(letter: &str) -> Result<usize, ColumnError> {
    if letter.is_empty() {
        return Err(ColumnError::InvalidLetter(letter.to_string()));
    }

    let mut result: usize = 0;
    for ch in letter.chars() {
        let upper = ch.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return Err(ColumnError::InvalidLetter(letter.to_string()));
        }
        result = result
            .checked_mul(26)
            .and_then(|r| r.checked_add((upper as u8 - b'A' + 1) as usize))
            .ok_or_else(|| ColumnError::InvalidLetter(letter.to_string()))?;
    }

    Ok(result - 1)
}

/// Convert a 0-based index to Excel-style column letters.
pub fn index_to_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// 列範囲（両端を含む）
///
/// `start` が `end` より後ろにある場合は空の範囲として扱う
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub start: String,
    pub end: String,
}

impl ColumnRange {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// 範囲に含まれる列インデックス
    pub fn indices(&self) -> Result<std::ops::RangeInclusive<usize>, ColumnError> {
        let start = letter_to_index(&self.start)?;
        let end = letter_to_index(&self.end)?;
        // start > end の RangeInclusive は空になる
        Ok(start..=end)
    }

    /// 範囲に含まれる列記号
    pub fn letters(&self) -> Result<Vec<String>, ColumnError> {
        Ok(self.indices()?.map(index_to_letter).collect())
    }

    pub fn end_index(&self) -> Result<usize, ColumnError> {
        letter_to_index(&self.end)
    }
}

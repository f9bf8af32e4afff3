//! # File Report DTO
//!
//! CSVファイルごとの処理結果と進捗

use std::fmt;

/// 1ファイルの処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// クリーンアップ後に行が残った
    Cleaned { rows: usize },
    /// フィルタ後にデータがない
    Empty,
    /// 読み込みまたはクリーンアップに失敗してスキップ
    Skipped { error: String },
}

/// ファイルごとのレポート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file_name: String,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn new(file_name: impl Into<String>, outcome: FileOutcome) -> Self {
        Self {
            file_name: file_name.into(),
            outcome,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, FileOutcome::Skipped { .. })
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            FileOutcome::Cleaned { rows } => {
                write!(f, "✓ {}: {} rows processed", self.file_name, rows)
            }
            FileOutcome::Empty => write!(f, "⚠ {}: No data after filtering", self.file_name),
            FileOutcome::Skipped { error } => {
                write!(f, "✗ Skipping {} due to error: {}", self.file_name, error)
            }
        }
    }
}

/// 進捗
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// 1始まり
    pub index: usize,
    pub total: usize,
    pub file_name: String,
}

impl Progress {
    pub fn new(index: usize, total: usize, file_name: impl Into<String>) -> Self {
        Self {
            index,
            total,
            file_name: file_name.into(),
        }
    }

    /// 進捗率（0〜100、切り捨て）
    ///
    /// ```
    /// use socpack::application::dto::file_report::Progress;
    ///
    /// assert_eq!(Progress::new(1, 3, "a.csv").percent(), 33);
    /// assert_eq!(Progress::new(3, 3, "c.csv").percent(), 100);
    /// assert_eq!(Progress::new(0, 0, "").percent(), 0);
    /// ```
    pub fn percent(&self) -> usize {
        self.index * 100 / self.total.max(1)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processing {} ({}/{})... {}% done",
            self.file_name,
            self.index,
            self.total,
            self.percent()
        )
    }
}

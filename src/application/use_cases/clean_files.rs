//! # Clean Files Use Case
//!
//! CSVファイルを1つずつ読み込んでクリーンアップする
//!
//! 失敗したファイルは警告を出してスキップし、残りのファイルの処理を続ける

use anyhow::Result;
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::dto::file_report::{FileOutcome, FileReport, Progress};
use crate::domain::entities::cleanup_rules::CleanupRules;
use crate::domain::entities::table::LetterTable;
use crate::domain::repositories::archive_repository::ArchiveRepository;
use crate::domain::services::cleanup::CleanupService;

/// クリーンアップ結果
#[derive(Debug, Clone, Default)]
pub struct CleanedFiles {
    /// ファイルごとのレポート（入力順）
    pub reports: Vec<FileReport>,
    /// 行が残った表のみ
    pub tables: Vec<LetterTable>,
}

impl CleanedFiles {
    pub fn skipped_count(&self) -> usize {
        self.reports.iter().filter(|r| r.is_skipped()).count()
    }
}

/// クリーンアップユースケース
pub struct CleanFilesUseCase<R: ArchiveRepository> {
    archive_repository: Arc<R>,
}

impl<R: ArchiveRepository> CleanFilesUseCase<R> {
    /// 新しいユースケースを作成
    pub fn new(archive_repository: Arc<R>) -> Self {
        Self { archive_repository }
    }

    /// 全ファイルをクリーンアップする
    ///
    /// # Arguments
    ///
    /// * `files` - CSVファイルのパス
    /// * `rules` - クリーンアップ規則
    /// * `on_progress` - 各ファイルの処理開始時に呼ばれる
    pub async fn execute<F>(
        &self,
        files: &[PathBuf],
        rules: &CleanupRules,
        mut on_progress: F,
    ) -> Result<CleanedFiles>
    where
        F: FnMut(&Progress) + Send,
    {
        let total = files.len();
        let mut cleaned = CleanedFiles::default();

        for (i, path) in files.iter().enumerate() {
            let file_name = display_name(path);
            on_progress(&Progress::new(i + 1, total, file_name.clone()));

            let outcome = match self.clean_one(path, rules).await {
                Ok(table) if table.is_empty() => FileOutcome::Empty,
                Ok(table) => {
                    let rows = table.len();
                    cleaned.tables.push(table);
                    FileOutcome::Cleaned { rows }
                }
                Err(e) => {
                    warn!("Skipping {} due to error: {:#}", file_name, e);
                    FileOutcome::Skipped {
                        error: format!("{:#}", e),
                    }
                }
            };
            cleaned.reports.push(FileReport::new(file_name, outcome));
        }

        Ok(cleaned)
    }

    async fn clean_one(&self, path: &Path, rules: &CleanupRules) -> Result<LetterTable> {
        let raw = self.archive_repository.read_csv(path).await?;
        Ok(CleanupService::clean(raw, rules)?)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

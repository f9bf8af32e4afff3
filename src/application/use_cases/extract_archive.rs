//! # Extract Archive Use Case
//!
//! アップロードされたZIPをタイムスタンプ付きフォルダに展開し、CSVを列挙する

use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone};
use log::info;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::repositories::archive_repository::ArchiveRepository;

/// 展開結果
#[derive(Debug, Clone)]
pub struct ExtractedArchive {
    /// 展開先フォルダ
    pub folder: PathBuf,
    /// フォルダ直下のCSV（名前順）
    pub csv_files: Vec<PathBuf>,
}

/// 展開先フォルダ名 `Upload_<Mon>-<DD>_<HH>-<MM><AM|PM>`
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use socpack::application::use_cases::extract_archive::upload_folder_name;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 7, 14, 5, 0).unwrap();
/// assert_eq!(upload_folder_name(&at), "Upload_Mar-07_14-05PM");
/// ```
pub fn upload_folder_name<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("Upload_{}", run_timestamp(at))
}

/// 展開先フォルダと出力CSVで共有する時刻ラベル `<Mon>-<DD>_<HH>-<MM><AM|PM>`
pub fn run_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format("%b-%d_%H-%M%p").to_string().replace(' ', "_")
}

/// ZIP展開ユースケース
pub struct ExtractArchiveUseCase<R: ArchiveRepository> {
    archive_repository: Arc<R>,
}

impl<R: ArchiveRepository> ExtractArchiveUseCase<R> {
    /// 新しいユースケースを作成
    ///
    /// # Arguments
    ///
    /// * `archive_repository` - アーカイブリポジトリ
    pub fn new(archive_repository: Arc<R>) -> Self {
        Self { archive_repository }
    }

    /// ZIPを展開してCSVを列挙する
    ///
    /// # Arguments
    ///
    /// * `archive` - ZIPファイルのパス
    /// * `work_dir` - 展開先フォルダを作るディレクトリ
    /// * `folder_name` - 展開先フォルダ名（通常は `upload_folder_name` の結果）。
    ///   同名のフォルダがあれば連番を付けた新しいフォルダに展開する
    ///
    /// # Errors
    ///
    /// ファイルが存在しない、拡張子が `.zip` でない、または展開に失敗した場合
    pub async fn execute(
        &self,
        archive: &Path,
        work_dir: &Path,
        folder_name: &str,
    ) -> Result<ExtractedArchive> {
        if !archive.exists() {
            bail!("File not found: {}", archive.display());
        }
        let is_zip = archive
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
        if !is_zip {
            bail!("Please provide a ZIP file: {}", archive.display());
        }

        let folder = self
            .archive_repository
            .create_folder(work_dir, folder_name)
            .await?;
        let extracted = self
            .archive_repository
            .extract(archive, &folder)
            .await
            .with_context(|| format!("Failed to extract ZIP: {}", archive.display()))?;
        info!("Extracted {} entries into {}", extracted, folder.display());

        let csv_files = self.archive_repository.list_csv_files(&folder).await?;

        Ok(ExtractedArchive { folder, csv_files })
    }
}

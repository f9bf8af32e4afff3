//! ZIP Archive Repository Implementation
//!
//! ArchiveRepositoryのファイルシステム実装（zip/csvクレート）

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::domain::entities::table::RawCsv;
use crate::domain::repositories::archive_repository::ArchiveRepository;

const UTF8_BOM: char = '\u{feff}';
const MAX_FOLDER_ATTEMPTS: usize = 1000;

/// ZIP/CSVファイルのリポジトリ
pub struct ZipArchiveRepository;

impl ZipArchiveRepository {
    /// 新しいリポジトリを作成
    pub fn new() -> Self {
        Self
    }

    /// 未使用の展開先フォルダを作る（同期処理）
    ///
    /// `create_dir` は既存フォルダで失敗するため、同時に実行されても同じフォルダは返らない
    fn create_folder_sync(parent: &Path, name: &str) -> Result<PathBuf> {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create folder: {}", parent.display()))?;

        for n in 1..=MAX_FOLDER_ATTEMPTS {
            let candidate = if n == 1 {
                parent.join(name)
            } else {
                parent.join(format!("{}_{}", name, n))
            };
            match fs::create_dir(&candidate) {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to create folder: {}", candidate.display())
                    })
                }
            }
        }
        bail!(
            "Too many upload folders named {} in {}",
            name,
            parent.display()
        )
    }

    /// ZIPを展開する（同期処理）
    ///
    /// 展開先の外を指すエントリは拒否する
    fn extract_sync(archive: &Path, dest: &Path) -> Result<usize> {
        let file = File::open(archive)
            .with_context(|| format!("Failed to open archive: {}", archive.display()))?;
        let mut zip = zip::ZipArchive::new(file).context("Not a valid ZIP archive")?;

        fs::create_dir_all(dest)
            .with_context(|| format!("Failed to create folder: {}", dest.display()))?;

        let mut extracted = 0;
        for i in 0..zip.len() {
            let mut entry = zip
                .by_index(i)
                .with_context(|| format!("Failed to read zip entry #{}", i))?;

            let Some(relative) = entry.enclosed_name() else {
                bail!("Refusing to extract unsafe path: {}", entry.name());
            };
            let target = dest.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&target)
                    .with_context(|| format!("Failed to create {}", target.display()))?;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let mut out = File::create(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
            io::copy(&mut entry, &mut out)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            extracted += 1;
        }

        Ok(extracted)
    }

    /// フォルダ直下のCSVを名前順で返す（同期処理）
    fn list_csv_files_sync(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            warn!("Folder does not exist: {}", dir.display());
            return Ok(Vec::new());
        }

        let mut csv_files: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        csv_files.sort();

        info!("Found {} CSV files in {}", csv_files.len(), dir.display());
        Ok(csv_files)
    }

    /// CSVを読み込む（同期処理）
    ///
    /// 先頭行をヘッダーとし、行ごとの列数の違いはそのまま残す
    fn read_csv_sync(path: &Path) -> Result<RawCsv> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV: {}", path.display()))?;

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record =
                record.with_context(|| format!("Failed to parse CSV line {}", i + 1))?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<String>>());
        }

        let mut rows = rows.into_iter();
        let mut header = rows
            .next()
            .ok_or_else(|| anyhow!("No columns to parse from file"))?;
        if let Some(first) = header.first_mut() {
            if first.starts_with(UTF8_BOM) {
                *first = first.trim_start_matches(UTF8_BOM).to_string();
            }
        }

        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(RawCsv::new(source, header, rows.collect()))
    }
}

#[async_trait]
impl ArchiveRepository for ZipArchiveRepository {
    async fn create_folder(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        let parent = parent.to_path_buf();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || Self::create_folder_sync(&parent, &name))
            .await
            .map_err(|e| anyhow!("Failed to spawn blocking task: {}", e))?
    }

    async fn extract(&self, archive: &Path, dest: &Path) -> Result<usize> {
        let archive = archive.to_path_buf();
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || Self::extract_sync(&archive, &dest))
            .await
            .map_err(|e| anyhow!("Failed to spawn blocking task: {}", e))?
    }

    async fn list_csv_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || Self::list_csv_files_sync(&dir))
            .await
            .map_err(|e| anyhow!("Failed to spawn blocking task: {}", e))?
    }

    async fn read_csv(&self, path: &Path) -> Result<RawCsv> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::read_csv_sync(&path))
            .await
            .map_err(|e| anyhow!("Failed to spawn blocking task: {}", e))?
    }
}

impl Default for ZipArchiveRepository {
    fn default() -> Self {
        Self::new()
    }
}

//! Workflow Orchestration
//!
//! ワークフローのオーケストレーション
//!
//! 展開 → クリーンアップ → マージ →（保存）→（シートへの書き込み）

use anyhow::Result;
use chrono::Local;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapter::config::Config;
use crate::adapter::repositories::csv_export_repository::CsvExportRepository;
use crate::adapter::repositories::google_sheet_repository::GoogleSheetFactory;
use crate::adapter::repositories::zip_archive_repository::ZipArchiveRepository;
use crate::application::dto::file_report::{FileReport, Progress};
use crate::application::use_cases::clean_files::CleanFilesUseCase;
use crate::application::use_cases::extract_archive::{
    run_timestamp, upload_folder_name, ExtractArchiveUseCase,
};
use crate::application::use_cases::publish_sheet::PublishSheetUseCase;
use crate::domain::entities::cleanup_rules::CleanupRules;
use crate::domain::entities::merged_table::MergedTable;
use crate::domain::repositories::export_repository::ExportRepository;
use crate::domain::repositories::sheet_repository::{SheetRepositoryFactory, SheetUpdate};
use crate::domain::services::merge::MergeService;

/// 1回の実行で行う処理
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// クリーンアップ済みCSVを保存する
    pub export: bool,
    /// Google Sheetsに書き込む
    pub upload: bool,
}

/// シートへの書き込み結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    NotRequested,
    Published(SheetUpdate),
    Failed(String),
}

/// 実行結果
#[derive(Debug, Clone)]
pub struct RunReport {
    /// ZIPの展開先
    pub folder: PathBuf,
    pub files: Vec<FileReport>,
    /// データが1行も残らなかった場合は `None`
    pub merged: Option<MergedTable>,
    /// 有効なデータを含んだファイル数
    pub tables_merged: usize,
    pub export_path: Option<PathBuf>,
    pub upload: UploadStatus,
}

impl RunReport {
    pub fn has_csv_files(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|r| r.is_skipped())
    }

    /// 処理が途中で終わった理由（正常終了なら `None`）
    pub fn notice(&self) -> Option<&'static str> {
        if !self.has_csv_files() {
            Some("No CSV files found in the ZIP")
        } else if self.merged.is_none() {
            Some("No data was processed successfully")
        } else {
            None
        }
    }
}

/// Archive Processing Workflow
pub struct ArchiveWorkflow {
    work_dir: PathBuf,
    rules: CleanupRules,
    extract_use_case: ExtractArchiveUseCase<ZipArchiveRepository>,
    clean_use_case: CleanFilesUseCase<ZipArchiveRepository>,
    export_repository: Arc<dyn ExportRepository>,
    sheet_factory: Arc<dyn SheetRepositoryFactory>,
}

impl ArchiveWorkflow {
    /// Create a new workflow instance with dependency injection
    pub fn new(config: Config, http: reqwest::Client) -> Self {
        let export_repository = Arc::new(CsvExportRepository::new(config.output_dir.clone()));
        let sheet_factory = Arc::new(GoogleSheetFactory::new(config.clone(), http));
        Self::with_repositories(&config, export_repository, sheet_factory)
    }

    /// 出力先とシート接続を差し替えて作成する
    pub fn with_repositories(
        config: &Config,
        export_repository: Arc<dyn ExportRepository>,
        sheet_factory: Arc<dyn SheetRepositoryFactory>,
    ) -> Self {
        let archive_repo = Arc::new(ZipArchiveRepository::new());

        Self {
            work_dir: config.work_dir.clone(),
            rules: config.rules.clone(),
            extract_use_case: ExtractArchiveUseCase::new(archive_repo.clone()),
            clean_use_case: CleanFilesUseCase::new(archive_repo),
            export_repository,
            sheet_factory,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Execute the workflow for one ZIP file
    ///
    /// 展開に失敗した場合のみエラーを返す。シートへの書き込み失敗は
    /// `UploadStatus::Failed` として報告する
    pub async fn run<F>(&self, zip: &Path, options: RunOptions, on_progress: F) -> Result<RunReport>
    where
        F: FnMut(&Progress) + Send,
    {
        let now = Local::now();
        let extracted = self
            .extract_use_case
            .execute(zip, &self.work_dir, &upload_folder_name(&now))
            .await?;

        let cleaned = self
            .clean_use_case
            .execute(&extracted.csv_files, &self.rules, on_progress)
            .await?;

        let mut report = RunReport {
            folder: extracted.folder,
            files: cleaned.reports,
            merged: None,
            tables_merged: cleaned.tables.len(),
            export_path: None,
            upload: UploadStatus::NotRequested,
        };

        if cleaned.tables.is_empty() {
            info!(
                "Nothing to merge ({} CSV files, {} skipped)",
                report.files.len(),
                report.skipped().count()
            );
            return Ok(report);
        }

        let merged = MergeService::merge(cleaned.tables, &self.rules);
        info!(
            "Merged {} rows x {} columns",
            merged.len(),
            merged.column_count()
        );

        if options.export {
            let stem = format!("cleaned_data_{}", run_timestamp(&now));
            report.export_path = Some(self.export_repository.export(&merged, &stem).await?);
        }

        if options.upload {
            report.upload = match self.publish(&merged).await {
                Ok(update) => UploadStatus::Published(update),
                Err(e) => {
                    warn!("Failed to upload to Google Sheets: {:#}", e);
                    UploadStatus::Failed(format!("{:#}", e))
                }
            };
        }

        report.merged = Some(merged);
        Ok(report)
    }

    async fn publish(&self, merged: &MergedTable) -> Result<SheetUpdate> {
        let sheet = self.sheet_factory.connect().await?;
        PublishSheetUseCase::new(sheet).execute(merged).await
    }
}

/// CLI向けに実行結果を表示する
pub fn print_report(report: &RunReport) {
    println!("✓ Extracted into {}", report.folder.display());
    for file in &report.files {
        println!("  {}", file);
    }

    if let Some(notice) = report.notice() {
        println!("✗ {}", notice);
        return;
    }
    let Some(merged) = &report.merged else {
        return;
    };

    println!();
    println!("✓ Processing complete!");
    println!("  Total rows: {}", merged.len());
    println!("  Total columns: {}", merged.column_count());

    println!();
    println!("Data preview:");
    println!("  {}", merged.letters.join(" | "));
    for row in merged.preview(5) {
        println!("  {}", row.join(" | "));
    }

    if let Some(path) = &report.export_path {
        println!();
        println!("✓ Data saved to: {}", path.display());
    }

    let mapping = merged.column_mapping();
    if !mapping.is_empty() {
        println!();
        println!("Column mapping (Letter -> Original Name):");
        for (letter, original) in mapping {
            println!("  {} -> {}", letter, original);
        }
    }

    match &report.upload {
        UploadStatus::NotRequested => {}
        UploadStatus::Published(update) => println!(
            "✓ Data uploaded to Google Sheets ({}, {} cells)",
            update.updated_range, update.updated_cells
        ),
        UploadStatus::Failed(error) => println!("✗ Failed to upload to Google Sheets: {}", error),
    }

    println!();
    println!(
        "✓ Success! Processed {} files with {} total rows",
        report.tables_merged,
        merged.len()
    );
}

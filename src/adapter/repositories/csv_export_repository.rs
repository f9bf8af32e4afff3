//! CSV Export Repository Implementation
//!
//! ExportRepositoryのCSVファイル実装

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::entities::merged_table::MergedTable;
use crate::domain::repositories::export_repository::ExportRepository;

/// CSVファイルへのエクスポート
///
/// ヘッダー行には列記号を書く
pub struct CsvExportRepository {
    output_dir: PathBuf,
}

impl CsvExportRepository {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn export_sync(table: &MergedTable, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("Failed to create output directory")?;
            }
        }

        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer
            .write_record(&table.letters)
            .context("Failed to write CSV header")?;
        for row in &table.rows {
            writer.write_record(row).context("Failed to write CSV row")?;
        }
        writer.flush().context("Failed to flush CSV")?;
        Ok(())
    }
}

#[async_trait]
impl ExportRepository for CsvExportRepository {
    async fn export(&self, table: &MergedTable, stem: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("{}.csv", stem));
        let rows = table.len();
        let table = table.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || Self::export_sync(&table, &target))
            .await
            .map_err(|e| anyhow!("Failed to spawn blocking task: {}", e))??;

        info!("Saved {} rows to {}", rows, path.display());
        Ok(path)
    }
}

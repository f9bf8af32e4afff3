//! # Export Repository Trait
//!
//! マージ済みの表のローカル保存を抽象化

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::entities::merged_table::MergedTable;

/// エクスポートリポジトリ
#[async_trait]
pub trait ExportRepository: Send + Sync {
    /// 表を保存する
    ///
    /// # Arguments
    ///
    /// * `table` - マージ済みの表
    /// * `stem` - ファイル名（拡張子なし）
    ///
    /// # Returns
    ///
    /// 保存したファイルのパス
    async fn export(&self, table: &MergedTable, stem: &str) -> Result<PathBuf>;
}

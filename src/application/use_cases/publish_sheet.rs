//! # Publish Sheet Use Case
//!
//! マージ済みの表でワークシートの内容を置き換える

use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;

use crate::domain::entities::merged_table::MergedTable;
use crate::domain::repositories::sheet_repository::{SheetRepository, SheetUpdate};

/// シート公開ユースケース
///
/// ワークシートを消去してから、ヘッダー行とデータ行をA1から書き込む
pub struct PublishSheetUseCase<S: SheetRepository + ?Sized> {
    sheet_repository: Arc<S>,
}

impl<S: SheetRepository + ?Sized> PublishSheetUseCase<S> {
    /// 新しいユースケースを作成
    ///
    /// # Arguments
    ///
    /// * `sheet_repository` - 書き込み先のシートリポジトリ
    pub fn new(sheet_repository: Arc<S>) -> Self {
        Self { sheet_repository }
    }

    /// 表を書き込む
    ///
    /// # Errors
    ///
    /// 消去または書き込みに失敗した場合にエラーを返す。
    /// 消去に失敗した場合は書き込みを行わない
    pub async fn execute(&self, table: &MergedTable) -> Result<SheetUpdate> {
        let target = self.sheet_repository.describe();
        info!("Publishing {} rows to {}", table.len(), target);

        self.sheet_repository
            .clear()
            .await
            .with_context(|| format!("Failed to clear {}", target))?;

        let update = self
            .sheet_repository
            .update(table.to_values())
            .await
            .with_context(|| format!("Failed to update {}", target))?;

        info!(
            "Updated {} ({} rows, {} cells)",
            update.updated_range, update.updated_rows, update.updated_cells
        );
        Ok(update)
    }
}

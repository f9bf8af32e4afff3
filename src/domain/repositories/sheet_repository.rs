//! # Sheet Repository Trait
//!
//! スプレッドシートのワークシートへの書き込みを抽象化

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// 書き込み結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetUpdate {
    /// 書き込まれた範囲（A1表記）
    pub updated_range: String,
    pub updated_rows: usize,
    pub updated_cells: usize,
}

impl SheetUpdate {
    pub fn new(updated_range: String, updated_rows: usize, updated_cells: usize) -> Self {
        Self {
            updated_range,
            updated_rows,
            updated_cells,
        }
    }
}

/// シートリポジトリ
///
/// 1つのワークシートに束縛されたリポジトリ
#[async_trait]
pub trait SheetRepository: Send + Sync {
    /// 書き込み先の説明（ログ表示用）
    fn describe(&self) -> String;

    /// ワークシートの全値を消去する
    async fn clear(&self) -> Result<()>;

    /// A1セルから値を書き込む
    ///
    /// # Arguments
    ///
    /// * `values` - 行ごとの値（1行目はヘッダー）
    async fn update(&self, values: Vec<Vec<String>>) -> Result<SheetUpdate>;
}

/// Factory for creating sheet repositories at publish time
#[async_trait]
pub trait SheetRepositoryFactory: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn SheetRepository>>;
}

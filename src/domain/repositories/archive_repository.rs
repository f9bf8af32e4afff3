//! # Archive Repository Trait
//!
//! ZIPの展開とCSVの読み込みを抽象化

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::entities::table::RawCsv;

/// アーカイブリポジトリ
///
/// アップロードされたZIPの展開と、その中のCSVの読み込みを担当するリポジトリ
#[async_trait]
pub trait ArchiveRepository: Send + Sync {
    /// 展開先フォルダを新しく作る
    ///
    /// `parent/name` が既にあれば `name_2`, `name_3`, ... を使う。
    /// 作成したフォルダは他の実行と共有されない
    async fn create_folder(&self, parent: &Path, name: &str) -> Result<PathBuf>;

    /// ZIPを展開する
    ///
    /// # Arguments
    ///
    /// * `archive` - ZIPファイルのパス
    /// * `dest` - 展開先ディレクトリ（存在しなければ作成する）
    ///
    /// # Returns
    ///
    /// 展開したファイルの数
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<usize>;

    /// ディレクトリ直下のCSVファイルを列挙する（名前順）
    async fn list_csv_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// CSVを読み込む
    ///
    /// # Errors
    ///
    /// ファイルが読めない、またはCSVとして解釈できない場合にエラーを返す
    async fn read_csv(&self, path: &Path) -> Result<RawCsv>;
}

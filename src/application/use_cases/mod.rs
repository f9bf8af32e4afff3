//! # Use Cases
//!
//! アプリケーションのビジネスフロー（ユースケース）
//!
//! ## ユースケース
//!
//! - **ExtractArchiveUseCase**: ZIPの展開とCSVの発見
//! - **CleanFilesUseCase**: CSVのクリーンアップ
//! - **PublishSheetUseCase**: ワークシートへの書き込み

pub mod clean_files;
pub mod extract_archive;
pub mod publish_sheet;

//! # Driver Layer (Presentation)
//!
//! CLIとWeb UIを提供
//!
//! ## 特徴
//!
//! - Use Caseを呼び出してビジネスフローを起動
//! - 依存性注入（DI）を行い、全てを組み立てる
//! - ユーザーとのインターフェース
//!
//! ## 構成要素
//!
//! - **cli**: CLI引数のパース
//! - **workflow**: ワークフロー全体のオーケストレーション
//! - **web**: アップロードフォーム（axum）

pub mod cli;
pub mod web;
pub mod workflow;

pub use cli::{Args, Command};
pub use workflow::{ArchiveWorkflow, RunOptions, RunReport, UploadStatus};

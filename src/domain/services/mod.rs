//! # Domain Services
//!
//! エンティティにまたがるビジネスルール
//!
//! - **CleanupService**: 1ファイル分のCSVのクリーンアップ
//! - **MergeService**: クリーンアップ済みの表のマージと整形

pub mod cleanup;
pub mod merge;

//! # Domain Entities
//!
//! ビジネスエンティティとバリューオブジェクトを定義するモジュール
//!
//! ## エンティティ
//!
//! - **column**: 列記号とインデックスの変換
//! - **CleanupRules**: フィルタ・ソート・列削除の規則
//! - **LetterTable**: 列記号でアドレス指定される表
//! - **MergedTable**: シートに書き込むマージ済みの表

pub mod cleanup_rules;
pub mod column;
pub mod merged_table;
pub mod table;

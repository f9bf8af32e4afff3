//! Adapter Layer
//!
//! 外部システム（Google Sheets, ファイルシステム）との統合

pub mod auth;
pub mod config;
pub mod repositories;
pub mod sheets;

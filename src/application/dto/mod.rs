//! # Data Transfer Objects
//!
//! ユースケースの入出力

pub mod file_report;

//! 統合テスト共通のフィクスチャ

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use socpack::domain::repositories::sheet_repository::{
    SheetRepository, SheetRepositoryFactory, SheetUpdate,
};
use zip::write::{SimpleFileOptions, ZipWriter};

/// 既定ルールで必要な列（A〜AH）を持つCSVのヘッダー
pub fn header() -> String {
    (0..34)
        .map(|i| format!("h{}", i))
        .collect::<Vec<_>>()
        .join(",")
}

/// K, M, X 列を指定した34列のデータ行
pub fn row(k: &str, m: &str, x: &str, tag: &str) -> String {
    (0..34)
        .map(|i| match i {
            10 => k.to_string(),
            12 => m.to_string(),
            23 => x.to_string(),
            _ => format!("{}{}", tag, i),
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn csv(rows: &[String]) -> String {
    let mut content = header();
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    content
}

pub fn write_zip(path: &Path, entries: &[(&str, String)]) {
    let file = File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    for (name, content) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

/// a.csv（2行一致）、b.csv（2行一致、X欠損あり）、c.csv（不正）、readme.txt
pub fn sample_bundle(path: &Path) {
    write_zip(
        path,
        &[
            (
                "a.csv",
                csv(&[
                    row("Station", "SOC 5", "10", "a"),
                    row("Other", "SOC 5", "1", "a"),
                    row("Station", "SOC 5", "2", "a"),
                ]),
            ),
            (
                "b.csv",
                csv(&[
                    row("Station", "SOC 5", "", "b"),
                    row("Station", "SOC 4", "3", "b"),
                    row("Station", "SOC 5", "5", "b"),
                ]),
            ),
            ("c.csv", "x,y\n1,2,3\n".to_string()),
            ("readme.txt", "not a csv".to_string()),
        ],
    );
}

/// 書き込まれた値を記録するシート
#[derive(Default)]
pub struct RecordingSheet {
    pub clears: Mutex<usize>,
    pub values: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl SheetRepository for RecordingSheet {
    fn describe(&self) -> String {
        "recording sheet".to_string()
    }

    async fn clear(&self) -> Result<()> {
        *self.clears.lock().unwrap() += 1;
        Ok(())
    }

    async fn update(&self, values: Vec<Vec<String>>) -> Result<SheetUpdate> {
        let rows = values.len();
        let cells = values.iter().map(Vec::len).sum();
        *self.values.lock().unwrap() = values;
        Ok(SheetUpdate::new("Sheet1!A1".to_string(), rows, cells))
    }
}

/// 常に同じ RecordingSheet を返すファクトリ
pub struct RecordingFactory {
    pub sheet: Arc<RecordingSheet>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self {
            sheet: Arc::new(RecordingSheet::default()),
        }
    }
}

#[async_trait]
impl SheetRepositoryFactory for RecordingFactory {
    async fn connect(&self) -> Result<Arc<dyn SheetRepository>> {
        Ok(self.sheet.clone())
    }
}

/// 接続に失敗するファクトリ
pub struct FailingFactory;

#[async_trait]
impl SheetRepositoryFactory for FailingFactory {
    async fn connect(&self) -> Result<Arc<dyn SheetRepository>> {
        anyhow::bail!("no service account credentials found")
    }
}

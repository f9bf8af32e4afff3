//! Web UI
//!
//! ZIPのアップロードフォームと処理結果ページ（axum）

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use log::{error, info, warn};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use super::workflow::{ArchiveWorkflow, RunOptions, RunReport, UploadStatus};

const TITLE: &str = "📊 SOCPacked Generated File";
const PREVIEW_ROWS: usize = 5;

#[derive(Clone)]
pub struct AppState {
    workflow: Arc<ArchiveWorkflow>,
}

impl AppState {
    pub fn new(workflow: Arc<ArchiveWorkflow>) -> Self {
        Self { workflow }
    }
}

/// ルーティングを組み立てる
pub fn create_app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn index() -> Html<String> {
    page("")
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let (file_name, bytes) = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => break (file_name, bytes),
                    Err(e) => return error_page(e.status(), &e.body_text()),
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => {
                return error_page(
                    StatusCode::BAD_REQUEST,
                    "Drop or upload a ZIP file with CSV files",
                )
            }
            Err(e) => return error_page(e.status(), &e.body_text()),
        }
    };

    if !is_zip_name(&file_name) || bytes.is_empty() {
        return error_page(
            StatusCode::BAD_REQUEST,
            &format!("Please upload a ZIP file (got '{}')", file_name),
        );
    }

    let archive = incoming_path(&state);
    if let Err(e) = save_upload(&archive, &bytes).await {
        error!("Failed to store upload: {:#}", e);
        return error_page(StatusCode::INTERNAL_SERVER_ERROR, &format!("{:#}", e));
    }
    info!("Received {} ({} bytes)", file_name, bytes.len());

    let mut progress = Vec::new();
    let options = RunOptions {
        export: false,
        upload: true,
    };
    let result = state
        .workflow
        .run(&archive, options, |p| progress.push(p.to_string()))
        .await;

    if let Err(e) = tokio::fs::remove_file(&archive).await {
        warn!("Failed to remove {}: {}", archive.display(), e);
    }

    match result {
        Ok(report) => page(&render_report(&progress, &report)).into_response(),
        Err(e) => error_page(StatusCode::BAD_REQUEST, &format!("{:#}", e)),
    }
}

fn is_zip_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".zip")
}

fn incoming_path(state: &AppState) -> PathBuf {
    state.workflow.work_dir().join(format!(
        "incoming_{}.zip",
        Utc::now().format("%Y%m%d%H%M%S%f")
    ))
}

async fn save_upload(path: &std::path::Path, bytes: &[u8]) -> anyhow::Result<()> {
    use anyhow::Context;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .context("Failed to create work directory")?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let body = format!(r#"<p class="error">✗ {}</p>"#, escape_html(message));
    (status, page(&body)).into_response()
}

/// 処理結果のHTML
fn render_report(progress: &[String], report: &RunReport) -> String {
    let mut html = String::new();

    if !progress.is_empty() {
        html.push_str(r#"<ul class="progress">"#);
        for line in progress {
            let _ = write!(html, "<li>{}</li>", escape_html(line));
        }
        html.push_str("</ul>");
    }

    for skipped in report.skipped() {
        let _ = write!(
            html,
            r#"<p class="warning">{}</p>"#,
            escape_html(&skipped.to_string())
        );
    }

    if let Some(notice) = report.notice() {
        let _ = write!(html, r#"<p class="error">✗ {}</p>"#, escape_html(notice));
        return html;
    }
    let Some(merged) = &report.merged else {
        return html;
    };

    html.push_str("<p>✅ Cleaned &amp; Merged Data Preview:</p><table><thead><tr>");
    for letter in &merged.letters {
        let _ = write!(html, "<th>{}</th>", escape_html(letter));
    }
    html.push_str("</tr></thead><tbody>");
    for row in merged.preview(PREVIEW_ROWS) {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape_html(cell));
        }
        html.push_str("</tr>");
    }
    let _ = write!(
        html,
        "</tbody></table><p>{} rows, {} columns</p>",
        merged.len(),
        merged.column_count()
    );

    match &report.upload {
        UploadStatus::Published(_) => {
            html.push_str(r#"<p class="success">🎉 Data uploaded to Google Sheets successfully!</p>"#)
        }
        UploadStatus::Failed(e) => {
            let _ = write!(
                html,
                r#"<p class="error">Failed to upload to Google Sheets: {}</p>"#,
                escape_html(e)
            );
        }
        UploadStatus::NotRequested => {}
    }

    html
}

fn page(body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>SOCPacked</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
table {{ border-collapse: collapse; }}
td, th {{ border: 1px solid #ccc; padding: 2px 6px; }}
.warning {{ color: #a86b00; }}
.error {{ color: #b00020; }}
.success {{ color: #1b7f3b; }}
</style>
</head>
<body>
<h1>{title}</h1>
<form action="/upload" method="post" enctype="multipart/form-data">
<label>Drop or Upload a ZIP file with CSV files
<input type="file" name="file" accept=".zip"></label>
<button type="submit">Upload</button>
</form>
{body}
</body>
</html>
"#,
        title = TITLE,
        body = body
    ))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

//! socpack - CSV bundle cleanup and Google Sheets publisher
//!
//! ZIPにまとめられたCSVをクリーンアップし、Google Sheets に書き込む

// coverage_nightly cfg が設定されている場合のみ coverage_attribute を有効化
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use socpack::adapter::auth::service_account::materialize_from_env;
use socpack::adapter::config::Config;
use socpack::adapter::sheets::client::build_http_client;
use socpack::driver::web::{create_app, AppState};
use socpack::driver::workflow::print_report;
use socpack::driver::{ArchiveWorkflow, Args, Command, RunOptions};

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    match args.command {
        Command::Serve { port, bind } => serve(config, port, bind).await,
        Command::Process {
            zip,
            upload,
            output,
        } => process(config, zip, upload, output).await,
        Command::MaterializeCredentials { from_env } => materialize(&config, &from_env),
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
async fn serve(config: Config, port: Option<u16>, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let port = port.unwrap_or(config.server.port);
    let max_upload_bytes = config.server.max_upload_bytes;

    let workflow = Arc::new(ArchiveWorkflow::new(config, build_http_client()?));
    let app = create_app(AppState::new(workflow), max_upload_bytes);

    let listener = tokio::net::TcpListener::bind((bind.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", bind, port))?;
    println!("✓ Listening on http://{}:{}", bind, port);

    axum::serve(listener, app).await.context("Server error")
}

#[cfg_attr(coverage_nightly, coverage(off))]
async fn process(
    mut config: Config,
    zip: PathBuf,
    upload: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    if let Some(output) = output {
        config.output_dir = output;
    }
    let workflow = ArchiveWorkflow::new(config, build_http_client()?);

    println!("Extracting {}...", zip.display());
    let options = RunOptions {
        export: true,
        upload,
    };
    let report = workflow
        .run(&zip, options, |p| println!("{}", p))
        .await?;
    print_report(&report);
    Ok(())
}

fn materialize(config: &Config, var: &str) -> Result<()> {
    if materialize_from_env(var, &config.service_account_key_path)? {
        println!(
            "✓ Wrote {} from {}",
            config.service_account_key_path, var
        );
    } else {
        println!("⚠ {} is not set; nothing written", var);
    }
    Ok(())
}

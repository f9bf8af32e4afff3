//! CLI Argument Parsing
//!
//! CLIの引数解析

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::adapter::auth::service_account::SERVICE_ACCOUNT_JSON_ENV;

/// CSVバンドルをクリーンアップしてGoogle Sheetsに書き込むツール
#[derive(Parser, Debug, Clone)]
#[command(name = "socpack")]
#[command(about = "Clean ZIP bundles of CSV exports and publish them to Google Sheets", long_about = None)]
pub struct Args {
    /// Config file path
    #[arg(short, long, global = true, default_value = "./socpack.json")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the web UI
    Serve {
        /// Port to listen on (default: server.port from config, 8501)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (default: server.bind from config)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Process a ZIP file from the command line and save the cleaned CSV
    Process {
        /// ZIP file with CSV exports
        zip: PathBuf,

        /// Also publish the result to Google Sheets
        #[arg(long)]
        upload: bool,

        /// Directory for the cleaned CSV (default: output_dir from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the service account key file from an environment variable
    MaterializeCredentials {
        /// Environment variable holding the key JSON
        #[arg(long, default_value = SERVICE_ACCOUNT_JSON_ENV)]
        from_env: String,
    },
}

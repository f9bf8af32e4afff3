//! Repository Implementations
//!
//! Domain層のRepositoryトレイトの実装

pub mod csv_export_repository;
pub mod google_sheet_repository;
pub mod zip_archive_repository;

pub use csv_export_repository::CsvExportRepository;
pub use google_sheet_repository::GoogleSheetRepository;
pub use zip_archive_repository::ZipArchiveRepository;

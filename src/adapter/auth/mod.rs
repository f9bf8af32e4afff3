//! Authentication Module
//!
//! Google APIのサービスアカウント認証

pub mod service_account;
pub mod token;

pub use service_account::{CredentialResolver, ServiceAccountKey};
pub use token::{AccessTokenSource, ServiceAccountTokenProvider};

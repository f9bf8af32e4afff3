//! Sheets API Retry Logic and Error Classification
//!
//! リトライロジックとエラー分類

use anyhow::Result;
use log::warn;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

// Exponential backoff as recommended for the Sheets API usage limits
pub const MAX_RETRIES: u32 = 5;
pub const INITIAL_RETRY_DELAY_MS: u64 = 1000;
pub const MAX_RETRY_DELAY_MS: u64 = 32000;

/// Calculate retry delay with exponential backoff
pub fn calculate_retry_delay(retry_count: u32) -> u64 {
    let shift = retry_count.saturating_sub(1).min(16);
    std::cmp::min(INITIAL_RETRY_DELAY_MS << shift, MAX_RETRY_DELAY_MS)
}

/// Convert error chain to string including all causes
pub fn error_chain_to_string(e: &anyhow::Error) -> String {
    let mut messages = Vec::new();
    for cause in e.chain() {
        messages.push(cause.to_string());
    }
    messages.join(" | ")
}

/// Check if an error is a dropped or refused connection
pub fn is_connection_error(error_msg: &str) -> bool {
    let lower = error_msg.to_ascii_lowercase();
    lower.contains("broken pipe")
        || lower.contains("connection reset")
        || lower.contains("connection refused")
        || lower.contains("connection closed")
        || lower.contains("error sending request")
        || lower.contains("unexpected end of file")
}

/// Check if an error is a server-side or rate-limit failure worth retrying
pub fn is_transient_error(error_msg: &str) -> bool {
    let lower = error_msg.to_ascii_lowercase();
    ["429", "500", "502", "503", "504"]
        .iter()
        .any(|code| error_msg.starts_with(code) || error_msg.contains(&format!(" {} ", code)))
        || lower.contains("rate limit")
        || lower.contains("quota")
        || lower.contains("timeout")
        || lower.contains("timed out")
}

/// Check if an error message indicates a retryable error
pub fn is_retryable_error(error_msg: &str) -> bool {
    is_connection_error(error_msg) || is_transient_error(error_msg)
}

/// 再試行可能なエラーの間、指数バックオフで `op` を繰り返す
pub async fn with_retry<T, F, Fut>(what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_retry_delays(what, &mut op, |attempt| {
        Duration::from_millis(calculate_retry_delay(attempt))
    })
    .await
}

async fn with_retry_delays<T, F, Fut, D>(what: &str, op: &mut F, delay: D) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    D: Fn(u32) -> Duration,
{
    let mut retry_count = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let error_msg = error_chain_to_string(&e);
                if is_retryable_error(&error_msg) && retry_count < MAX_RETRIES {
                    retry_count += 1;
                    let wait = delay(retry_count);
                    warn!(
                        "{} failed (attempt {}), retrying in {}ms: {}",
                        what,
                        retry_count,
                        wait.as_millis(),
                        error_msg
                    );
                    sleep(wait).await;
                    continue;
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_calculate_retry_delay() {
        assert_eq!(calculate_retry_delay(1), 1000);
        assert_eq!(calculate_retry_delay(2), 2000);
        assert_eq!(calculate_retry_delay(3), 4000);
        assert_eq!(calculate_retry_delay(6), MAX_RETRY_DELAY_MS);
        assert_eq!(calculate_retry_delay(40), MAX_RETRY_DELAY_MS);
    }

    #[test]
    fn test_calculate_retry_delay_zero() {
        assert_eq!(calculate_retry_delay(0), INITIAL_RETRY_DELAY_MS);
    }

    #[test]
    fn test_is_connection_error() {
        assert!(is_connection_error("Broken pipe"));
        assert!(is_connection_error("connection reset by peer"));
        assert!(is_connection_error(
            "error sending request for url (https://sheets.googleapis.com/)"
        ));
        assert!(!is_connection_error("503 Service Unavailable"));
        assert!(!is_connection_error("400 Unable to parse range"));
    }

    #[test]
    fn test_is_transient_error() {
        assert!(is_transient_error("429 Too Many Requests"));
        assert!(is_transient_error("503 Service Unavailable"));
        assert!(is_transient_error("Sheets update: 500 Internal error"));
        assert!(is_transient_error("Quota exceeded for quota metric"));
        assert!(is_transient_error("operation timed out"));

        assert!(!is_transient_error("400 Unable to parse range: Sheet9!A1"));
        assert!(!is_transient_error("403 The caller does not have permission"));
        assert!(!is_transient_error("404 Requested entity was not found"));
    }

    #[test]
    fn test_is_retryable_error_non_retryable() {
        assert!(!is_retryable_error("Invalid request"));
        assert!(!is_retryable_error("401 Request had invalid authentication credentials"));
    }

    #[test]
    fn test_error_chain_to_string() {
        use anyhow::Context;

        let inner_error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "Broken pipe");
        let error = anyhow::Error::from(inner_error).context("Sheets clear failed");

        let error_msg = error_chain_to_string(&error);

        assert_eq!(error_msg, "Sheets clear failed | Broken pipe");
        assert!(is_retryable_error(&error_msg));
    }

    #[tokio::test]
    async fn test_with_retry_recovers_from_transient() {
        let attempts = AtomicU32::new(0);
        let mut op = || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    anyhow::bail!("503 Service Unavailable")
                }
                Ok(n)
            }
        };

        let result = with_retry_delays("test", &mut op, |_| Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(result, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_gives_up_on_permanent() {
        let attempts = AtomicU32::new(0);
        let mut op = || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(anyhow::anyhow!("403 The caller does not have permission")) }
        };

        let result = with_retry_delays("test", &mut op, |_| Duration::ZERO).await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_stops_after_max_retries() {
        let attempts = AtomicU32::new(0);
        let mut op = || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(anyhow::anyhow!("429 Too Many Requests")) }
        };

        let result = with_retry_delays("test", &mut op, |_| Duration::ZERO).await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }

    #[test]
    fn test_constants() {
        assert_eq!(MAX_RETRIES, 5);
        assert_eq!(INITIAL_RETRY_DELAY_MS, 1000);
        assert_eq!(MAX_RETRY_DELAY_MS, 32000);
    }
}

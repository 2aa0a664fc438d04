use crate::error::{EtlError, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

/// Outcome of a successful archive download.
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub url: String,
    pub bytes_written: u64,
    pub sha256: String,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

/// Stream the archive at `url` to `dest` in chunks, overwriting any previous
/// file. Transient failures (connect errors, timeouts, 5xx, truncated bodies)
/// are retried up to `options.retries` times; everything else fails at once.
#[instrument(skip(options), fields(dest = %dest.display()))]
pub async fn fetch_archive(url: &str, dest: &Path, options: &FetchOptions) -> Result<FetchReport> {
    let client = reqwest::Client::builder()
        .timeout(options.timeout)
        .build()?;

    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match stream_to_file(&client, url, dest).await {
            Ok((bytes_written, sha256)) => {
                info!(bytes = bytes_written, attempts = attempt, "download complete");
                return Ok(FetchReport {
                    url: url.to_string(),
                    bytes_written,
                    sha256,
                    attempts: attempt,
                });
            }
            Err(e) if attempt <= options.retries && is_transient(&e) => {
                warn!(attempt, error = %e, "transient download failure, retrying");
                tokio::time::sleep(options.retry_delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn stream_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<(u64, String)> {
    let mut response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(EtlError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let expected = response.content_length();

    let mut file = tokio::fs::File::create(dest).await?;
    let mut hasher = Sha256::new();
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        hasher.update(&chunk);
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if let Some(expected) = expected {
        if written != expected {
            return Err(EtlError::TruncatedDownload { expected, written });
        }
    }
    Ok((written, hex::encode(hasher.finalize())))
}

fn is_transient(err: &EtlError) -> bool {
    match err {
        EtlError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
        EtlError::TruncatedDownload { .. } => true,
        EtlError::Status { status, .. } => *status >= 500,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        let transient = EtlError::Status {
            url: "http://example.test/a.tgz".into(),
            status: 503,
        };
        let fatal = EtlError::Status {
            url: "http://example.test/a.tgz".into(),
            status: 404,
        };
        assert!(is_transient(&transient));
        assert!(!is_transient(&fatal));
    }

    #[test]
    fn truncated_downloads_are_transient() {
        let err = EtlError::TruncatedDownload {
            expected: 100,
            written: 42,
        };
        assert!(is_transient(&err));
    }
}

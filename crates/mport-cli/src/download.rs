//! Streaming download with SHA-256 verification.
//!
//! One GET, one hasher pass, no range requests — index entries here are
//! single bundle archives, not multi-gigabyte manifests.

use crate::error::CliError;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Download `url` to `dest`, verifying the result against `expected_sha256`
/// (hex-encoded). Removes the file on mismatch.
pub async fn download_and_verify(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    expected_sha256: &str,
) -> Result<(), CliError> {
    let response = client.get(url).send().await.map_err(CliError::Network)?;
    let response = response.error_for_status().map_err(CliError::Network)?;
    let bytes = response.bytes().await.map_err(CliError::Network)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);

    let mut file = tokio::fs::File::create(dest).await.map_err(CliError::Io)?;
    file.write_all(&bytes).await.map_err(CliError::Io)?;
    file.flush().await.map_err(CliError::Io)?;

    let actual = hex::encode(hasher.finalize());
    if !expected_sha256.is_empty() && actual != expected_sha256.to_ascii_lowercase() {
        let _ = tokio::fs::remove_file(dest).await;
        return Err(CliError::Other(format!(
            "checksum mismatch for {url}: expected {expected_sha256}, got {actual}"
        )));
    }
    Ok(())
}

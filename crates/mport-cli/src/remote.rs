//! Read-only index source and mirror selector.
//!
//! The index fetcher and mirror selector are treated as an external
//! collaborator, so this module is a concrete but deliberately thin
//! stand-in: fetch a Postcard+Zstd document, cache it locally, and offer
//! simple name/query lookups. The `mirror` command's mirror selection
//! pings every configured mirror up to 3 times, 1s apart, and keeps the
//! fastest responder.

use crate::error::CliError;
use mport_schema::IndexEntry;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// A fetched package index: a flat list of available package versions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Index {
    /// Every known package version, across all origins.
    pub entries: Vec<IndexEntry>,
}

impl Index {
    /// Look up the entry for an exact package name (last-wins if an index
    /// carries more than one version per name).
    pub fn find(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.iter().filter(|e| e.name.as_str() == name).last()
    }

    /// Free-text search across name and origin.
    pub fn search<'a>(&'a self, query: &str) -> Vec<&'a IndexEntry> {
        let query = query.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|e| e.name.as_str().to_ascii_lowercase().contains(&query) || e.origin.to_ascii_lowercase().contains(&query))
            .collect()
    }

    /// Fetch the index document from `url` and decode it.
    pub async fn fetch(url: &str, client: &Client) -> Result<Self, CliError> {
        let bytes = client
            .get(url)
            .send()
            .await
            .map_err(CliError::Network)?
            .error_for_status()
            .map_err(CliError::Network)?
            .bytes()
            .await
            .map_err(CliError::Network)?;
        decode(&bytes)
    }

    /// Load a previously cached index from disk.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let bytes = std::fs::read(path).map_err(CliError::Io)?;
        decode(&bytes)
    }

    /// Persist the index to disk, Zstd-compressed Postcard.
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(CliError::Io)?;
        }
        let encoded = postcard::to_allocvec(self).map_err(|e| CliError::Other(e.to_string()))?;
        let compressed = zstd::stream::encode_all(encoded.as_slice(), 0).map_err(CliError::Io)?;
        std::fs::write(path, compressed).map_err(CliError::Io)
    }
}

/// Little-endian Zstd frame magic, used to auto-detect a compressed index.
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

fn decode(bytes: &[u8]) -> Result<Index, CliError> {
    let decompressed = if bytes.len() >= 4 && bytes[0..4] == ZSTD_MAGIC {
        zstd::stream::decode_all(bytes).map_err(CliError::Io)?
    } else {
        bytes.to_vec()
    };
    postcard::from_bytes(&decompressed).map_err(|e| CliError::Other(format!("invalid index format: {e}")))
}

/// Ping every candidate mirror (a bare `HEAD /`) with up to 3 attempts, 1s
/// apart, and return the first that answers successfully.
pub async fn select_mirror(mirrors: &[String], client: &Client) -> Option<String> {
    for mirror in mirrors {
        for attempt in 0..3 {
            match client.head(mirror).send().await {
                Ok(resp) if resp.status().is_success() => return Some(mirror.clone()),
                _ if attempt < 2 => tokio::time::sleep(Duration::from_secs(1)).await,
                _ => {}
            }
        }
    }
    None
}

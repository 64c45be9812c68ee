// Smile Bot Relay — File uploads
//
// `POST /upload` takes a multipart body with one file part. The storage
// backend is picked at startup: local disk by default, or a remote object
// store when a base URL is configured (one HTTP PUT of the raw bytes). The
// reported `fileInfo.size` is always the byte length of the uploaded part.

use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ── Wire shape ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub provider: String,
}

// ── Multipart parsing ──────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub struct FilePart {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Extract the first file part (a `filename=` disposition) from a
/// `multipart/form-data` body. Missing boundary or missing file part are
/// bad requests, not server errors.
pub fn parse_multipart(content_type: &str, body: &[u8]) -> RelayResult<FilePart> {
    let boundary = content_type
        .split(';')
        .map(str::trim)
        .find_map(|p| p.strip_prefix("boundary="))
        .map(|b| b.trim_matches('"'))
        .ok_or_else(|| RelayError::BadRequest("missing multipart boundary".into()))?;

    let delimiter = format!("--{}", boundary).into_bytes();

    let mut offset = 0;
    while let Some(start) = find(&body[offset..], &delimiter) {
        let part_start = offset + start + delimiter.len();
        // Closing delimiter is "--boundary--"
        if body[part_start..].starts_with(b"--") {
            break;
        }
        let Some(head_end) = find(&body[part_start..], b"\r\n\r\n") else {
            break;
        };
        let head = String::from_utf8_lossy(&body[part_start..part_start + head_end]);
        let data_start = part_start + head_end + 4;
        let data_end = find(&body[data_start..], &delimiter)
            .map(|next| data_start + next)
            .unwrap_or(body.len());

        if let Some(filename) = disposition_filename(&head) {
            // Strip the trailing CRLF that precedes the next delimiter.
            let mut data = body[data_start..data_end].to_vec();
            if data.ends_with(b"\r\n") {
                data.truncate(data.len() - 2);
            }
            return Ok(FilePart { filename, data });
        }
        offset = data_end;
    }

    Err(RelayError::BadRequest("no file part in upload".into()))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn disposition_filename(part_head: &str) -> Option<String> {
    for line in part_head.lines() {
        if !line.to_ascii_lowercase().starts_with("content-disposition:") {
            continue;
        }
        for attr in line.split(';').map(str::trim) {
            if let Some(value) = attr.strip_prefix("filename=") {
                let name = value.trim_matches('"').trim();
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
        }
    }
    None
}

// ── Storage backends ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Local { dir: PathBuf },
    Remote { client: reqwest::Client, base_url: String },
}

impl StorageBackend {
    pub fn from_config(config: &RelayConfig, client: reqwest::Client) -> Self {
        match &config.remote_storage_url {
            Some(url) => StorageBackend::Remote {
                client,
                base_url: url.trim_end_matches('/').to_string(),
            },
            None => StorageBackend::Local {
                dir: config.upload_dir.clone(),
            },
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            StorageBackend::Local { .. } => "local",
            StorageBackend::Remote { .. } => "remote",
        }
    }

    /// Persist the part and describe where it went. Stored names get a uuid
    /// suffix so repeated uploads of the same filename never collide.
    pub async fn store(&self, part: &FilePart) -> RelayResult<FileInfo> {
        let stored_name = unique_name(&part.filename);
        match self {
            StorageBackend::Local { dir } => {
                let dest = dir.join(&stored_name);
                tokio::fs::write(&dest, &part.data)
                    .await
                    .map_err(|e| RelayError::Storage(format!("write {}: {}", dest.display(), e)))?;
                Ok(FileInfo {
                    name: part.filename.clone(),
                    size: part.data.len() as u64,
                    path: Some(dest.to_string_lossy().into_owned()),
                    url: None,
                    provider: "local".into(),
                })
            }
            StorageBackend::Remote { client, base_url } => {
                let url = format!("{}/{}", base_url, stored_name);
                let resp = client
                    .put(&url)
                    .body(part.data.clone())
                    .send()
                    .await
                    .map_err(|e| RelayError::Storage(format!("remote put: {}", e)))?;
                if !resp.status().is_success() {
                    return Err(RelayError::Storage(format!(
                        "remote store returned {}",
                        resp.status()
                    )));
                }
                Ok(FileInfo {
                    name: part.filename.clone(),
                    size: part.data.len() as u64,
                    path: None,
                    url: Some(url),
                    provider: "remote".into(),
                })
            }
        }
    }
}

/// `file-<uuid><ext>` — keeps the original extension, drops the rest of the
/// client-supplied name (it may contain path separators).
fn unique_name(original: &str) -> String {
    let ext = Path::new(original)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!("file-{}{}", uuid::Uuid::new_v4(), ext)
}

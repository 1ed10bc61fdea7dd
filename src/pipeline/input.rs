//! Input resolution: normalise a user-supplied path or URL to PDF bytes.
//!
//! Both the content interpreter (lopdf) and the page renderer (pdfium) open
//! the document from memory, so a URL is downloaded straight into a buffer
//! and never touches the file system. The `%PDF` magic is checked before
//! returning so callers get a meaningful error rather than a parser failure.

use crate::error::ExtractError;
use std::path::PathBuf;
use tracing::{debug, info};

/// A PDF loaded into memory together with a display name for logs and errors.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    /// File name (local input) or last URL path segment.
    pub source_name: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to the bytes of a PDF.
///
/// URLs are downloaded with the given timeout; anything else is read as a
/// local file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractError> {
    if input.trim().is_empty() {
        return Err(ExtractError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Read a local file, validating existence and PDF magic bytes.
pub fn resolve_local(path_str: &str) -> Result<ResolvedInput, ExtractError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(ExtractError::FileNotFound { path });
    }

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(e) => {
            return Err(ExtractError::ReadFailed { path, source: e });
        }
    };

    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());
    check_magic(&source_name, &bytes)?;

    debug!("Resolved local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(ResolvedInput { source_name, bytes })
}

/// Reject buffers that do not start with `%PDF`.
pub fn check_magic(source_name: &str, bytes: &[u8]) -> Result<(), ExtractError> {
    if bytes.starts_with(b"%PDF") {
        return Ok(());
    }
    Err(ExtractError::NotAPdf {
        source_name: source_name.to_string(),
        magic: bytes.iter().take(4).copied().collect(),
    })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractError> {
    info!("Downloading PDF from: {}", url);

    let parsed = reqwest::Url::parse(url).map_err(|_| ExtractError::InvalidInput {
        input: url.to_string(),
    })?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let failed = |e: reqwest::Error| {
        if e.is_timeout() {
            ExtractError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ExtractError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(parsed.clone()).send().await.map_err(failed)?;

    if !response.status().is_success() {
        return Err(ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(failed)?.to_vec();
    let source_name = filename_from_url(&parsed);
    check_magic(&source_name, &bytes)?;

    info!("Downloaded {} ({} bytes)", source_name, bytes.len());
    Ok(ResolvedInput { source_name, bytes })
}

/// Last non-empty path segment of the URL, or `downloaded.pdf`.
fn filename_from_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|last| !last.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

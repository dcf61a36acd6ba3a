//! Payload encoding: local files, remote assets, and raw bytes → base64
//! [`EncodedAsset`] ready for the service request body.
//!
//! The service accepts binary content as base64 inline data in the JSON
//! request. Documents are validated against the `%PDF` magic bytes before
//! encoding so callers get a meaningful read failure instead of an opaque
//! service rejection. Read failures (missing file, permission, wrong format)
//! are kept distinct from network failures on remote fetches.

use crate::error::BillError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// A text-safe, transport-ready encoding of some binary asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedAsset {
    /// Base64 payload, no format-declaration prefix.
    pub data: String,
    pub mime_type: String,
    pub file_name: String,
}

impl EncodedAsset {
    /// Render as a `data:` URI for embedding.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Encode raw bytes. Any `data:` prefix handling happens upstream; this is
/// the one place bytes become base64.
pub fn encode_bytes(
    bytes: &[u8],
    mime_type: impl Into<String>,
    file_name: impl Into<String>,
) -> EncodedAsset {
    let data = STANDARD.encode(bytes);
    debug!("encoded {} bytes → {} base64 chars", bytes.len(), data.len());
    EncodedAsset {
        data,
        mime_type: mime_type.into(),
        file_name: file_name.into(),
    }
}

/// Strip an embedded format-declaration prefix
/// (`data:application/pdf;base64,....` → `....`).
///
/// Returns the input unchanged when no prefix is present.
pub fn strip_data_uri_prefix(payload: &str) -> &str {
    if !payload.starts_with("data:") {
        return payload;
    }
    match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read and encode a local bill PDF, validating the magic bytes.
pub async fn encode_document(path: impl AsRef<Path>) -> Result<EncodedAsset, BillError> {
    let path = path.as_ref();

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(BillError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(BillError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let mut magic = [0u8; 4];
    let prefix_len = bytes.len().min(4);
    magic[..prefix_len].copy_from_slice(&bytes[..prefix_len]);
    if &magic != b"%PDF" {
        return Err(BillError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    debug!("read bill PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(encode_bytes(&bytes, "application/pdf", file_name))
}

/// Resolve and encode the collage reference image: a URL is downloaded, a
/// `data:` URI is unwrapped, a local path is read. No magic check — any
/// image the service understands is acceptable.
pub async fn resolve_reference(
    source: &str,
    timeout_secs: u64,
) -> Result<EncodedAsset, BillError> {
    if let Some(asset) = decode_data_uri(source) {
        Ok(asset)
    } else if is_url(source) {
        fetch_and_encode(source, timeout_secs).await
    } else {
        let path = Path::new(source);
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(BillError::PermissionDenied {
                    path: path.to_path_buf(),
                });
            }
            Err(_) => {
                return Err(BillError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "reference".to_string());
        Ok(encode_bytes(&bytes, mime_for_name(&file_name), file_name))
    }
}

/// Unwrap an already-encoded `data:` URI into an asset.
fn decode_data_uri(source: &str) -> Option<EncodedAsset> {
    let rest = source.strip_prefix("data:")?;
    let (header, _) = rest.split_once(',')?;
    let mime_type = header
        .split(';')
        .next()
        .filter(|m| !m.is_empty())
        .unwrap_or("application/octet-stream");
    Some(EncodedAsset {
        data: strip_data_uri_prefix(source).to_string(),
        mime_type: mime_type.to_string(),
        file_name: "reference".to_string(),
    })
}

/// Download a remote asset and encode it.
async fn fetch_and_encode(url: &str, timeout_secs: u64) -> Result<EncodedAsset, BillError> {
    info!("fetching remote asset: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| BillError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            BillError::FetchTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            BillError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(BillError::FetchFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let mime_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

    let file_name = extract_file_name(url);

    let bytes = response.bytes().await.map_err(|e| BillError::FetchFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let mime_type = mime_type.unwrap_or_else(|| mime_for_name(&file_name).to_string());
    Ok(encode_bytes(&bytes, mime_type, file_name))
}

/// Extract a reasonable file name from the URL path.
fn extract_file_name(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "reference".to_string()
}

/// Mime type by file extension; jpeg is the safe default for photos.
fn mime_for_name(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else if lower.ends_with(".pdf") {
        "application/pdf"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn encode_bytes_is_valid_base64() {
        let asset = encode_bytes(b"%PDF-1.7 pretend", "application/pdf", "bill.pdf");
        assert_eq!(asset.mime_type, "application/pdf");
        let decoded = STANDARD.decode(&asset.data).expect("valid base64");
        assert_eq!(decoded, b"%PDF-1.7 pretend");
    }

    #[test]
    fn data_uri_prefix_is_stripped() {
        assert_eq!(
            strip_data_uri_prefix("data:application/pdf;base64,JVBERi0x"),
            "JVBERi0x"
        );
        assert_eq!(strip_data_uri_prefix("JVBERi0x"), "JVBERi0x");
        // Malformed prefix without a comma passes through untouched.
        assert_eq!(strip_data_uri_prefix("data:nonsense"), "data:nonsense");
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/hero.jpg"));
        assert!(is_url("http://example.com/hero.jpg"));
        assert!(!is_url("/tmp/hero.jpg"));
        assert!(!is_url("hero.jpg"));
        assert!(!is_url(""));
    }

    #[test]
    fn mime_by_extension() {
        assert_eq!(mime_for_name("hero.PNG"), "image/png");
        assert_eq!(mime_for_name("hero.webp"), "image/webp");
        assert_eq!(mime_for_name("hero.jpg"), "image/jpeg");
        assert_eq!(mime_for_name("hero"), "image/jpeg");
    }

    #[tokio::test]
    async fn encode_document_accepts_a_pdf() {
        let mut file = tempfile::NamedTempFile::with_suffix(".pdf").unwrap();
        file.write_all(b"%PDF-1.4\nnot much of a document").unwrap();

        let asset = encode_document(file.path()).await.expect("must encode");
        assert_eq!(asset.mime_type, "application/pdf");
        assert!(asset.file_name.ends_with(".pdf"));
        assert!(!asset.data.is_empty());
    }

    #[tokio::test]
    async fn encode_document_rejects_non_pdf() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"PK\x03\x04zipzipzip").unwrap();

        let err = encode_document(file.path()).await.unwrap_err();
        assert!(matches!(err, BillError::NotAPdf { .. }));
        assert!(err.is_read_failure());
    }

    #[tokio::test]
    async fn encode_document_rejects_truncated_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%P").unwrap();

        let err = encode_document(file.path()).await.unwrap_err();
        assert!(matches!(err, BillError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn encode_document_missing_file() {
        let err = encode_document("/definitely/not/here.pdf").await.unwrap_err();
        assert!(matches!(err, BillError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn resolve_reference_unwraps_data_uri() {
        let asset = resolve_reference("data:image/png;base64,aW1n", 5)
            .await
            .expect("data uri must resolve");
        assert_eq!(asset.mime_type, "image/png");
        assert_eq!(asset.data, "aW1n");
    }

    #[tokio::test]
    async fn resolve_reference_reads_local_image() {
        let mut file = tempfile::NamedTempFile::with_suffix(".png").unwrap();
        file.write_all(b"\x89PNG fake").unwrap();

        let asset = resolve_reference(file.path().to_str().unwrap(), 5)
            .await
            .expect("must read");
        assert_eq!(asset.mime_type, "image/png");
    }
}

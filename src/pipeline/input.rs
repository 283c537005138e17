//! Input resolution: normalise a user-supplied path or URL to a local image.
//!
//! ## Why download to a temp file?
//!
//! Keeping the resolved input as a filesystem path keeps the entry point
//! symmetric for both local files and URLs, and a `TempDir` guarantees the
//! downloaded copy is removed when `ResolvedInput` drops — on success,
//! failure, or panic. The JPEG/PNG signature is validated up front so callers
//! get a meaningful error rather than a decoder failure three stages later.

use crate::error::ImgToDocxError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PNG_MAGIC: [u8; 4] = [0x89, b'P', b'N', b'G'];
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// The resolved input — either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the `TempDir` holds the downloaded copy alive until
    /// the pipeline is done with it.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Path to the image file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            Self::Local(p) | Self::Downloaded { path: p, .. } => p,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// True for the two accepted raster formats: PNG (`\x89PNG`) and
/// JPEG (`\xFF\xD8\xFF`).
pub fn is_supported_image(magic: &[u8]) -> bool {
    magic.starts_with(&PNG_MAGIC) || magic.starts_with(&JPEG_MAGIC)
}

/// First four bytes of a buffer, zero-padded. Shared by the local-file and
/// download paths so both reject unsupported formats identically.
fn sniff_magic(head: &[u8]) -> [u8; 4] {
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    magic
}

/// Resolve the input string to a local image file path.
///
/// URLs are downloaded to a temporary directory; local paths are validated
/// for existence, readability, and image signature.
pub async fn resolve_input(
    input: &str,
    timeout_secs: u64,
) -> Result<ResolvedInput, ImgToDocxError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if input.contains("://") {
        // ftp://, file:// and friends: neither a fetchable URL nor a path.
        Err(ImgToDocxError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        resolve_local(input)
    }
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, ImgToDocxError> {
    let path = PathBuf::from(path_str);

    let mut file = std::fs::File::open(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ImgToDocxError::PermissionDenied { path: path.clone() },
        _ => ImgToDocxError::FileNotFound { path: path.clone() },
    })?;

    let mut head = [0u8; 4];
    let n = file.read(&mut head).unwrap_or(0);
    if !is_supported_image(&head[..n]) {
        return Err(ImgToDocxError::NotAnImage {
            path,
            magic: sniff_magic(&head[..n]),
        });
    }

    debug!("Resolved local image: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ImgToDocxError> {
    info!("Downloading image from: {}", url);

    let network_err = |reason: String| ImgToDocxError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| network_err(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ImgToDocxError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            network_err(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(network_err(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| network_err(e.to_string()))?;

    let temp_dir = TempDir::new().map_err(|e| ImgToDocxError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(extract_filename(url));

    if !is_supported_image(&bytes) {
        return Err(ImgToDocxError::NotAnImage {
            path: file_path,
            magic: sniff_magic(&bytes),
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| ImgToDocxError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Pick a filename for the downloaded copy from the last URL path segment,
/// falling back to a fixed name for extension-less URLs.
fn extract_filename(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "downloaded.png".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_detection() {
        assert!(is_url("https://example.com/scan.png"));
        assert!(is_url("http://example.com/scan.jpg"));
        assert!(!is_url("/tmp/scan.png"));
        assert!(!is_url("scan.png"));
        assert!(!is_url(""));
    }

    #[test]
    fn magic_bytes_detection() {
        assert!(is_supported_image(&PNG_MAGIC));
        assert!(is_supported_image(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!is_supported_image(b"GIF8"));
        assert!(!is_supported_image(b"%PDF"));
        assert!(!is_supported_image(b""));
    }

    #[test]
    fn sniff_pads_short_buffers() {
        assert_eq!(sniff_magic(b"ab"), [b'a', b'b', 0, 0]);
        assert_eq!(sniff_magic(b"abcdef"), [b'a', b'b', b'c', b'd']);
    }

    #[tokio::test]
    async fn non_http_scheme_is_rejected() {
        let err = resolve_input("ftp://example.com/scan.png", 5).await.unwrap_err();
        assert!(matches!(err, ImgToDocxError::InvalidInput { .. }));

        let err = resolve_input("file:///tmp/scan.png", 5).await.unwrap_err();
        assert!(matches!(err, ImgToDocxError::InvalidInput { .. }));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = resolve_local("/definitely/not/a/real/scan.png").unwrap_err();
        assert!(matches!(err, ImgToDocxError::FileNotFound { .. }));
    }

    #[test]
    fn non_image_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"%PDF-1.7 not an image").unwrap();

        let err = resolve_local(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ImgToDocxError::NotAnImage { .. }));
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();

        let err = resolve_local(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ImgToDocxError::NotAnImage { .. }));
    }

    // Result<ResolvedInput, _>::unwrap in these tests needs the Debug impl;
    // pin it so it cannot be dropped silently.
    #[test]
    fn resolved_input_is_debuggable() {
        let resolved = ResolvedInput::Local(PathBuf::from("/tmp/scan.png"));
        assert!(format!("{resolved:?}").contains("scan.png"));
    }

    #[test]
    fn valid_png_signature_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();

        let resolved = resolve_local(path.to_str().unwrap()).unwrap();
        assert_eq!(resolved.path(), path);
    }

    #[test]
    fn filename_from_url() {
        assert_eq!(
            extract_filename("https://example.com/scans/page1.jpg"),
            "page1.jpg"
        );
        assert_eq!(extract_filename("https://example.com/"), "downloaded.png");
        assert_eq!(
            extract_filename("https://example.com/no-extension"),
            "downloaded.png"
        );
    }
}

//! PNG encoding and atomic file output.
//!
//! Every artefact the extractor produces is a PNG written through
//! [`write_png`], which goes through a temp file + rename so a reader never
//! sees a half-written image, and primes the optional [`FileContentCache`]
//! with the bytes it just wrote.
//!
//! [`encode_png_base64`] wraps PNG bytes as the base64 payload multimodal
//! request bodies expect.

use crate::cache::FileContentCache;
use crate::error::ExtractError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// A base64 image payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// Base64 (standard alphabet, padded).
    pub data: String,
    pub mime_type: String,
}

impl EncodedImage {
    /// `data:<mime>;base64,<data>`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Encode an RGB buffer as PNG bytes.
pub fn png_bytes(img: &RgbImage) -> Result<Vec<u8>, ExtractError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| ExtractError::Internal(format!("PNG encoding failed: {e}")))?;
    Ok(buf)
}

/// Wrap PNG bytes as a base64 payload.
pub fn encode_png_base64(png: &[u8]) -> EncodedImage {
    let data = STANDARD.encode(png);
    debug!("Encoded image → {} bytes base64", data.len());
    EncodedImage {
        data,
        mime_type: "image/png".to_string(),
    }
}

/// Atomically write `bytes` to `path`, creating parent directories.
///
/// On success the cache (when given) holds exactly the bytes written.
pub fn write_png(
    path: &Path,
    bytes: &[u8],
    cache: Option<&FileContentCache>,
) -> Result<(), ExtractError> {
    let fail = |source| ExtractError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(fail)?;
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.png".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    std::fs::write(&tmp, bytes).map_err(fail)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(fail(e));
    }

    if let Some(cache) = cache {
        cache.insert(path, bytes.to_vec());
    }
    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn encode_small_image() {
        let img = RgbImage::from_pixel(10, 10, Rgb([255, 0, 0]));
        let png = png_bytes(&img).expect("encode should succeed");
        let data = encode_png_base64(&png);
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(decoded, png);
        assert!(data.to_data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn png_encoding_is_deterministic() {
        let img = RgbImage::from_fn(37, 11, |x, y| Rgb([x as u8, y as u8, 7]));
        assert_eq!(png_bytes(&img).unwrap(), png_bytes(&img).unwrap());
    }

    #[test]
    fn write_creates_dirs_and_primes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page-0000").join("full.png");
        let cache = FileContentCache::new(1 << 20);

        write_png(&path, b"png-bytes", Some(&cache)).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");
        assert_eq!(cache.get(&path).as_deref(), Some(&b"png-bytes"[..]));
        // no temp file left behind
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path, b"one", None).unwrap();
        write_png(&path, b"two", None).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"two");
    }
}

//! Format detection utilities.
//!
//! Detects image formats from magic bytes first and file extensions second.

use crate::IoResult;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Image file formats known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Windows bitmap.
    Bmp,
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// TIFF format.
    Tiff,
    /// GIF (read only).
    Gif,
    /// Photoshop document (read only).
    Psd,
    /// Unknown format.
    Unknown,
}

impl Format {
    /// All known formats, `Unknown` excluded.
    pub const ALL: [Format; 6] = [
        Format::Bmp,
        Format::Png,
        Format::Jpeg,
        Format::Tiff,
        Format::Gif,
        Format::Psd,
    ];

    /// Detects format from file path (magic bytes, then extension).
    pub fn detect<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let path = path.as_ref();

        if let Ok(format) = Self::from_magic_bytes(path) {
            if format != Format::Unknown {
                return Ok(format);
            }
        }

        Ok(Self::from_extension(path))
    }

    /// Detects format from file extension only.
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("bmp") | Some("dib") => Format::Bmp,
            Some("png") => Format::Png,
            Some("jpg") | Some("jpeg") | Some("jpe") => Format::Jpeg,
            Some("tif") | Some("tiff") => Format::Tiff,
            Some("gif") => Format::Gif,
            Some("psd") => Format::Psd,
            _ => Format::Unknown,
        }
    }

    /// Detects format from the first bytes of a file.
    pub fn from_magic_bytes<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let mut file = File::open(path)?;
        let mut header = [0u8; 8];

        let bytes_read = file.read(&mut header)?;
        Ok(Self::from_bytes(&header[..bytes_read]))
    }

    /// Detects format from raw bytes (magic number check).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        // PNG: 0x89 P N G \r \n 0x1A \n
        if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Format::Png;
        }
        // JPEG: SOI followed by a marker
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Format::Jpeg;
        }
        // TIFF: II*\0 or MM\0*
        if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
            return Format::Tiff;
        }
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            return Format::Gif;
        }
        if bytes.starts_with(b"8BPS") {
            return Format::Psd;
        }
        // BMP last: two bytes is a weak signature
        if bytes.starts_with(b"BM") {
            return Format::Bmp;
        }
        Format::Unknown
    }

    /// Typical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Bmp => "bmp",
            Format::Png => "png",
            Format::Jpeg => "jpg",
            Format::Tiff => "tif",
            Format::Gif => "gif",
            Format::Psd => "psd",
            Format::Unknown => "",
        }
    }

    /// MIME type.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Bmp => "image/bmp",
            Format::Png => "image/png",
            Format::Jpeg => "image/jpeg",
            Format::Tiff => "image/tiff",
            Format::Gif => "image/gif",
            Format::Psd => "image/vnd.adobe.photoshop",
            Format::Unknown => "application/octet-stream",
        }
    }

    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Bmp => "BMP",
            Format::Png => "PNG",
            Format::Jpeg => "JPEG",
            Format::Tiff => "TIFF",
            Format::Gif => "GIF",
            Format::Psd => "PSD",
            Format::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_bytes() {
        assert_eq!(Format::from_bytes(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]), Format::Png);
        assert_eq!(Format::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Format::Jpeg);
        assert_eq!(Format::from_bytes(b"II*\0rest"), Format::Tiff);
        assert_eq!(Format::from_bytes(b"MM\0*rest"), Format::Tiff);
        assert_eq!(Format::from_bytes(b"GIF89a.."), Format::Gif);
        assert_eq!(Format::from_bytes(b"8BPS\0\x01"), Format::Psd);
        assert_eq!(Format::from_bytes(b"BM6\0\0\0"), Format::Bmp);
        assert_eq!(Format::from_bytes(b"xy"), Format::Unknown);
        assert_eq!(Format::from_bytes(&[]), Format::Unknown);
    }

    #[test]
    fn test_extension() {
        assert_eq!(Format::from_extension("a/b/scan.TIFF"), Format::Tiff);
        assert_eq!(Format::from_extension("photo.jpeg"), Format::Jpeg);
        assert_eq!(Format::from_extension("noext"), Format::Unknown);
        for f in Format::ALL {
            assert_eq!(Format::from_extension(format!("x.{}", f.extension())), f);
        }
    }

    #[test]
    fn test_detect_prefers_signature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("misnamed.jpg");
        std::fs::write(&path, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0]).unwrap();
        assert_eq!(Format::detect(&path).unwrap(), Format::Png);

        let empty = dir.path().join("empty.tif");
        std::fs::write(&empty, []).unwrap();
        assert_eq!(Format::detect(&empty).unwrap(), Format::Tiff);
    }
}

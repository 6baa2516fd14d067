use std::path::{Path, PathBuf};

use walkdir::WalkDir;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Tiff,
    WebP,
    Heif,
    Unknown,
}

impl ImageFormat {
    /// Whether Exif tags can be embedded in files of this format.
    pub fn supports_embedded_exif(self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::WebP | Self::Heif)
    }

    /// Whether the XMP toolkit has a handler that can rewrite the packet.
    pub fn supports_embedded_xmp(self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::Tiff)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Tiff => "TIFF",
            Self::WebP => "WebP",
            Self::Heif => "HEIF",
            Self::Unknown => "unknown",
        }
    }
}

pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tif", "tiff", "webp", "heic", "heif",
];

pub fn detect_format(path: &Path) -> ImageFormat {
    let Some(ext) = path.extension().and_then(|value| value.to_str()) else {
        return ImageFormat::Unknown;
    };

    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => ImageFormat::Jpeg,
        "png" => ImageFormat::Png,
        "tif" | "tiff" => ImageFormat::Tiff,
        "webp" => ImageFormat::WebP,
        "heic" | "heif" => ImageFormat::Heif,
        _ => ImageFormat::Unknown,
    }
}

pub fn is_supported(path: &Path) -> bool {
    detect_format(path) != ImageFormat::Unknown
}

pub fn supports_embedded_exif(path: &Path) -> bool {
    detect_format(path).supports_embedded_exif()
}

pub fn supports_embedded_xmp(path: &Path) -> bool {
    detect_format(path).supports_embedded_xmp()
}

/// Supported image files among `paths`, descending into directories.
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            let mut found = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.into_path())
                .filter(|p| p.is_file() && is_supported(p))
                .collect::<Vec<_>>();
            found.sort();
            images.extend(found);
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_case_insensitively() {
        assert_eq!(detect_format(Path::new("a/IMG_0001.JPG")), ImageFormat::Jpeg);
        assert_eq!(detect_format(Path::new("scan.tiff")), ImageFormat::Tiff);
        assert_eq!(detect_format(Path::new("notes.txt")), ImageFormat::Unknown);
        assert_eq!(detect_format(Path::new("no_extension")), ImageFormat::Unknown);
    }

    #[test]
    fn only_some_formats_embed_exif() {
        assert!(supports_embedded_exif(Path::new("photo.heic")));
        assert!(!supports_embedded_exif(Path::new("scan.tif")));
        assert!(!supports_embedded_exif(Path::new("photo.raw")));
    }

    #[test]
    fn xmp_embedding_covers_tiff_but_not_heif() {
        assert!(supports_embedded_xmp(Path::new("scan.tif")));
        assert!(supports_embedded_xmp(Path::new("photo.JPG")));
        assert!(!supports_embedded_xmp(Path::new("photo.heic")));
    }
}

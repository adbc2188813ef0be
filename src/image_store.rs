use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::ImageFormat;
use tracing::{debug, info};

use crate::llm::media::{detect_mime_type, is_supported_upload};

/// Thumbnails fit inside a square of this size.
pub const THUMBNAIL_SIZE: u32 = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub image_path: PathBuf,
    pub thumbnail_path: PathBuf,
}

/// Upload and thumbnail directories. Files are keyed by their upload name;
/// saving the same name again overwrites both files.
#[derive(Debug, Clone)]
pub struct ImageStore {
    uploads_dir: PathBuf,
    thumbnails_dir: PathBuf,
}

fn sanitize_file_name(file_name: &str) -> Result<String> {
    let name = Path::new(file_name.trim())
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        return Err(anyhow!("Invalid upload file name: {file_name:?}"));
    }
    Ok(name)
}

impl ImageStore {
    pub fn new(uploads_dir: impl Into<PathBuf>, thumbnails_dir: impl Into<PathBuf>) -> Self {
        ImageStore {
            uploads_dir: uploads_dir.into(),
            thumbnails_dir: thumbnails_dir.into(),
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.uploads_dir, &self.thumbnails_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn save(&self, bytes: &[u8], file_name: &str) -> Result<StoredImage> {
        let name = sanitize_file_name(file_name)?;
        let mime_type = detect_mime_type(bytes).unwrap_or_else(|| "unknown".to_string());
        if !is_supported_upload(&mime_type) {
            return Err(anyhow!(
                "Unsupported upload {name}: detected type {mime_type}, expected a JPEG or PNG image"
            ));
        }

        self.ensure_directories()?;

        let image_path = self.uploads_dir.join(&name);
        fs::write(&image_path, bytes)
            .with_context(|| format!("Failed to write upload {}", image_path.display()))?;
        debug!("Wrote {} byte(s) to {}", bytes.len(), image_path.display());

        let thumbnail_path = self.thumbnails_dir.join(&name);
        write_thumbnail(bytes, &mime_type, &thumbnail_path)?;

        info!(
            "Stored upload {} with thumbnail {}",
            image_path.display(),
            thumbnail_path.display()
        );
        Ok(StoredImage {
            image_path,
            thumbnail_path,
        })
    }
}

fn write_thumbnail(bytes: &[u8], mime_type: &str, thumbnail_path: &Path) -> Result<()> {
    let format = ImageFormat::from_mime_type(mime_type)
        .ok_or_else(|| anyhow!("No image format for {mime_type}"))?;
    let img = image::load_from_memory(bytes)
        .with_context(|| format!("Failed to decode image for {}", thumbnail_path.display()))?;

    // Never upscale; only shrink to fit the bounding square.
    let thumbnail = if img.width() > THUMBNAIL_SIZE || img.height() > THUMBNAIL_SIZE {
        img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
    } else {
        img
    };

    thumbnail
        .save_with_format(thumbnail_path, format)
        .with_context(|| format!("Failed to write thumbnail {}", thumbnail_path.display()))?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    use image::{DynamicImage, RgbImage};
    use tempfile::TempDir;

    pub(crate) fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([200, 80, 40])));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    fn store_in(dir: &TempDir) -> ImageStore {
        ImageStore::new(dir.path().join("uploads"), dir.path().join("thumbnails"))
    }

    #[test]
    fn save_writes_original_and_bounded_thumbnail() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let bytes = encoded_image(640, 320, ImageFormat::Png);

        let stored = store.save(&bytes, "wide.png").unwrap();

        assert_eq!(stored.image_path, dir.path().join("uploads").join("wide.png"));
        assert_eq!(fs::read(&stored.image_path).unwrap(), bytes);
        let thumb = image::open(&stored.thumbnail_path).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (128, 64));
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let dir = TempDir::new().unwrap();
        let stored = store_in(&dir)
            .save(&encoded_image(40, 90, ImageFormat::Jpeg), "small.jpg")
            .unwrap();
        let thumb = image::open(&stored.thumbnail_path).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (40, 90));
    }

    #[test]
    fn saving_same_name_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let first = store.save(&encoded_image(300, 300, ImageFormat::Png), "a.png").unwrap();
        let replacement = encoded_image(64, 32, ImageFormat::Png);
        let second = store.save(&replacement, "a.png").unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read(&second.image_path).unwrap(), replacement);
        let thumb = image::open(&second.thumbnail_path).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (64, 32));
    }

    #[test]
    fn directory_components_are_stripped_from_names() {
        let dir = TempDir::new().unwrap();
        let stored = store_in(&dir)
            .save(&encoded_image(10, 10, ImageFormat::Png), "../../etc/evil.png")
            .unwrap();
        assert_eq!(stored.image_path, dir.path().join("uploads").join("evil.png"));
    }

    #[test]
    fn rejects_non_image_uploads_and_empty_names() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let err = store.save(b"plain text", "notes.jpg").unwrap_err();
        assert!(err.to_string().contains("expected a JPEG or PNG"));
        assert!(!dir.path().join("uploads").join("notes.jpg").exists());

        assert!(store.save(&encoded_image(4, 4, ImageFormat::Png), "  ").is_err());
    }

    #[test]
    fn names_without_extension_keep_the_sniffed_format() {
        let dir = TempDir::new().unwrap();
        let stored = store_in(&dir)
            .save(&encoded_image(200, 100, ImageFormat::Png), "scan")
            .unwrap();
        let thumb = image::load_from_memory(&fs::read(&stored.thumbnail_path).unwrap()).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (128, 64));
    }

    #[test]
    fn ensure_directories_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.ensure_directories().unwrap();
        store.ensure_directories().unwrap();
        assert!(dir.path().join("thumbnails").is_dir());
    }
}

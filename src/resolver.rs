use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::{ImageError, ImageReader};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "ico", "webp"];

/// A source that has been checked to exist and to hold a readable image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    pub source: String,
    pub path: PathBuf,
    /// Displayed size, after EXIF orientation.
    pub width: u32,
    pub height: u32,
}

/// Turns a source reference into something displayable.
///
/// Called once when an entry is queued and again right before the entry is
/// faded in, so an implementation must report sources that went away in
/// between.
pub trait ImageResolver {
    fn resolve(&self, source: &str) -> Result<ImageHandle>;
}

/// Resolves local paths and `file://` URIs by probing the image header.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalResolver;

impl ImageResolver for LocalResolver {
    fn resolve(&self, source: &str) -> Result<ImageHandle> {
        let path = local_path(source);
        if !path.exists() {
            return Err(Error::NotFound(source.to_string()));
        }
        if !path.is_file() {
            return Err(Error::UnsupportedFormat(source.to_string()));
        }

        let reader = ImageReader::open(&path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => Error::NotFound(source.to_string()),
                _ => Error::UnsupportedFormat(source.to_string()),
            })?;
        if reader.format().is_none() {
            return Err(Error::UnsupportedFormat(source.to_string()));
        }
        let (raw_width, raw_height) = reader
            .into_dimensions()
            .map_err(|err| classify_image_error(source, err))?;

        // Orientations 5..=8 rotate by a quarter turn.
        let (width, height) = match read_orientation(&path) {
            Some(5..=8) => (raw_height, raw_width),
            _ => (raw_width, raw_height),
        };
        debug!(source, width, height, "resolved image");

        Ok(ImageHandle {
            source: source.to_string(),
            path,
            width,
            height,
        })
    }
}

fn classify_image_error(source: &str, err: ImageError) -> Error {
    match err {
        ImageError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
            Error::NotFound(source.to_string())
        }
        _ => Error::UnsupportedFormat(source.to_string()),
    }
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0).map(|o| o as u16)
}

/// Maps `file://` URIs to paths; anything else is taken as a path verbatim.
pub fn local_path(source: &str) -> PathBuf {
    if source.starts_with("file://") {
        if let Some(path) = reqwest::Url::parse(source)
            .ok()
            .and_then(|url| url.to_file_path().ok())
        {
            return path;
        }
    }
    PathBuf::from(source)
}

#[inline]
pub fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(OsStr::to_str)
            .map(|s| s.to_ascii_lowercase()),
        Some(ref e) if SUPPORTED_EXTENSIONS.contains(&e.as_str())
    )
}

/// Replaces directory sources with the image files found beneath them, in
/// path order. Other sources pass through untouched so the resolver can
/// report them.
pub fn expand_sources(sources: Vec<String>) -> Vec<String> {
    let mut expanded = Vec::with_capacity(sources.len());
    for source in sources {
        let path = local_path(&source);
        if !path.is_dir() {
            expanded.push(source);
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(&path)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|p| is_image(p))
            .collect();
        found.sort();
        debug!(dir = %path.display(), images = found.len(), "expanded directory");
        expanded.extend(found.into_iter().map(|p| p.to_string_lossy().into_owned()));
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use std::fs;

    // JPEG 2x1 with EXIF orientation 6 (rotate 90 CW), base64 encoded
    const ORIENT6_JPEG: &str = concat!(
        "/9j/4AAQSkZJRgABAQAAAQABAAD/4QAiRXhpZgAATU0AKgAAAAgAAQESAAMAAAABAAYAAAAAAAD/2wBDAAgGBgcGBQgHBwcJCQgKDBQNDAsLDBkSEw8UHRofHh0aHBwgJC4nICIsIxwcKDcpLDAxNDQ0Hyc5PTgyPC4zNDL/",
        "2wBDAQkJCQwLDBgNDRgyIRwhMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjL/wAARCAABAAIDASIAAhEBAxEB/8QAHwAAAQUBAQEBAQEAAAAAAAAAAAECAwQFBgcICQoL/8QAtRAAAgEDAwIEAwUFBAQAAAF9AQIDAAQRBRIhMUEGE1FhByJxFDKBkaEII0KxwRVS0fAkM2JyggkKFhcYGRolJicoKSo0NTY3ODk6Q0RFRkdISUpTVFVWV1hZWmNkZWZnaGlqc3R1dnd4eXqDhIWGh4iJipKTlJWWl5iZmqKjpKWmp6ipqrKztLW2t7i5usLDxMXGx8jJytLT1NXW19jZ2uHi4+Tl5ufo6erx8vP09fb3+Pn6/8QAHwEAAwEBAQEBAQEBAQAAAAAAAAECAwQFBgcICQoL/8QAtREAAgECBAQDBAcFBAQAAQJ3AAECAxEEBSExBhJBUQdhcRMiMoEIFEKRobHBCSMzUvAVYnLRChYkNOEl8RcYGRomJygpKjU2Nzg5OkNERUZHSElKU1RVVldYWVpjZGVmZ2hpanN0dXZ3eHl6goOEhYaHiImKkpOUlZaXmJmaoqOkpaanqKmqsrO0tba3uLm6wsPExcbHyMnK0tPU1dbX2Nna4uPk5ebn6Onq8vP09fb3+Pn6/9oADAMBAAIRAxEAPwDi6KKK+ZP3E//Z"
    );

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbaImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn resolves_png_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path, 3, 2);
        let source = path.to_string_lossy().into_owned();

        let handle = LocalResolver.resolve(&source).unwrap();
        assert_eq!((handle.width, handle.height), (3, 2));
        assert_eq!(handle.path, path);
        assert_eq!(handle.source, source);
    }

    #[test]
    fn accepts_file_uris() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.png");
        write_png(&path, 1, 1);
        let uri = reqwest::Url::from_file_path(&path).unwrap().to_string();

        let handle = LocalResolver.resolve(&uri).unwrap();
        assert_eq!(handle.path, path);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("gone.png").to_string_lossy().into_owned();
        assert_eq!(
            LocalResolver.resolve(&source),
            Err(Error::NotFound(source.clone()))
        );
    }

    #[test]
    fn non_images_are_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("notes.txt");
        fs::write(&text, b"hello").unwrap();
        let corrupt = dir.path().join("broken.png");
        fs::write(&corrupt, b"not really a png").unwrap();

        for path in [text, corrupt, dir.path().to_path_buf()] {
            let source = path.to_string_lossy().into_owned();
            assert_eq!(
                LocalResolver.resolve(&source),
                Err(Error::UnsupportedFormat(source.clone()))
            );
        }
    }

    #[test]
    fn rotated_jpeg_reports_displayed_size() {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(ORIENT6_JPEG)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orient6.jpg");
        fs::write(&path, &bytes).unwrap();

        let handle = LocalResolver.resolve(&path.to_string_lossy()).unwrap();
        assert_eq!((handle.width, handle.height), (1, 2));
    }

    #[test]
    fn expands_directories_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("b.png"), b"x").unwrap();
        fs::write(root.join("a.JPG"), b"x").unwrap();
        fs::write(root.join("nested").join("c.webp"), b"x").unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();

        let loose = "elsewhere/z.png".to_string();
        let expanded = expand_sources(vec![
            root.to_string_lossy().into_owned(),
            loose.clone(),
        ]);

        let rel: Vec<String> = expanded[..3]
            .iter()
            .map(|p| {
                Path::new(p)
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(rel, vec!["a.JPG", "b.png", "nested/c.webp"]);
        assert_eq!(expanded[3], loose);
    }
}

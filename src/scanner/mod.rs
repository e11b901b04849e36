use crate::error::{NeoCareError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// A file picked for upload, held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct FileRef {
    pub name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl FileRef {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(NeoCareError::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime_type = mime_for(path).unwrap_or("application/octet-stream");

        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
];

/// Image MIME type from the extension (case-insensitive)
pub fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Image files under `folder`, sorted by file name
pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(NeoCareError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut images: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && mime_for(p).is_some())
        .collect();

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// Expand a mix of files and folders into image paths, keeping argument order
pub fn collect_images(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_dir() {
            images.extend(scan_folder(path, recursive)?);
        } else if path.is_file() {
            if mime_for(path).is_some() {
                images.push(path.clone());
            } else {
                tracing::debug!(path = %path.display(), "skipping non-image file");
            }
        } else {
            return Err(NeoCareError::FileNotFound(path.display().to_string()));
        }
    }

    Ok(images)
}

/// Read every path into memory
pub fn load_files(paths: &[PathBuf]) -> Result<Vec<FileRef>> {
    paths.iter().map(|p| FileRef::from_path(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for(Path::new("a.JPG")), Some("image/jpeg"));
        assert_eq!(mime_for(Path::new("a.png")), Some("image/png"));
        assert_eq!(mime_for(Path::new("notes.txt")), None);
        assert_eq!(mime_for(Path::new("no_extension")), None);
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"), false);
        assert!(matches!(result, Err(NeoCareError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_sorted_images_only() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("c.jpg")).unwrap().write_all(b"x").unwrap();
        File::create(dir.path().join("a.PNG")).unwrap().write_all(b"x").unwrap();
        File::create(dir.path().join("readme.txt")).unwrap().write_all(b"x").unwrap();

        let result = scan_folder(dir.path(), false).unwrap();
        let names: Vec<_> = result
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.PNG", "c.jpg"]);
    }

    #[test]
    fn test_scan_folder_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        File::create(dir.path().join("top.jpg")).unwrap();
        File::create(dir.path().join("nested").join("deep.jpg")).unwrap();

        assert_eq!(scan_folder(dir.path(), false).unwrap().len(), 1);
        assert_eq!(scan_folder(dir.path(), true).unwrap().len(), 2);
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spo2.jpeg");
        std::fs::write(&path, b"fake jpeg").unwrap();

        let file = FileRef::from_path(&path).unwrap();
        assert_eq!(file.name, "spo2.jpeg");
        assert_eq!(file.mime_type, "image/jpeg");
        assert_eq!(file.size(), 9);
        assert!(file.is_image());

        assert!(matches!(
            FileRef::from_path(&dir.path().join("missing.jpg")),
            Err(NeoCareError::FileNotFound(_))
        ));
    }
}

//! Files offered for import, and expansion of directories into files.

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    /// File name shown in the album and used for downloads.
    pub name: String,
    pub size: u64,
    pub mime: Option<&'static str>,
}

impl CandidateFile {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime = mime_for_path(&path);
        Self {
            path,
            name,
            size,
            mime,
        }
    }

    pub fn from_path(path: &Path) -> io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self::new(path.to_path_buf(), meta.len()))
    }

    pub fn is_image(&self) -> bool {
        self.mime.is_some_and(|m| m.starts_with("image/"))
    }
}

/// MIME type guessed from the file extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "tif" | "tiff" => "image/tiff",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(mime)
}

/// Turn user-supplied paths into candidate files.
///
/// Files are taken as given (non-images are dropped later). Directories are
/// walked and only files with one of `extensions` are picked up, sorted by
/// path.
pub fn expand_inputs(paths: &[PathBuf], extensions: &[String]) -> io::Result<Vec<CandidateFile>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| p.is_file() && has_extension(p, extensions))
                .collect();
            found.sort();
            for p in found {
                files.push(CandidateFile::from_path(&p)?);
            }
        } else {
            files.push(CandidateFile::from_path(path)?);
        }
    }

    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.iter().any(|e| e.to_lowercase() == ext))
}

/// Split a user-typed list of paths. Entries are separated by commas; a
/// leading `~/` expands to the home directory.
pub fn parse_path_list(input: &str) -> Vec<PathBuf> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(s)),
            None => PathBuf::from(s),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_expand_directory_and_files() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("photo1.jpg"), b"jpg").unwrap();
        File::create(dir.path().join("photo2.png")).unwrap();
        File::create(dir.path().join("document.txt")).unwrap();

        fs::create_dir(dir.path().join("subdir")).unwrap();
        File::create(dir.path().join("subdir/photo3.jpeg")).unwrap();

        let loose = dir.path().join("document.txt");
        let extensions = vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()];
        let files = expand_inputs(&[dir.path().to_path_buf(), loose], &extensions).unwrap();

        assert_eq!(files.len(), 4);
        assert_eq!(files[0].name, "photo1.jpg");
        assert_eq!(files[0].size, 3);
        assert_eq!(files[0].mime, Some("image/jpeg"));
        // explicitly listed files are kept even when they are not images
        assert_eq!(files[3].name, "document.txt");
        assert!(!files[3].is_image());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(expand_inputs(&[dir.path().join("nope.jpg")], &[]).is_err());
    }

    #[test]
    fn test_parse_path_list() {
        let paths = parse_path_list(" a.jpg, ,photos/b.png ,");
        assert_eq!(paths, vec![PathBuf::from("a.jpg"), PathBuf::from("photos/b.png")]);
    }
}

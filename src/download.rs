//! Saving a single album photo to disk.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::album::Album;
use crate::data_url::{self, DataUrlError};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("photo {index} not found (album has {len})")]
    NoSuchPhoto { index: usize, len: usize },

    #[error("photo data is unreadable: {0}")]
    BadData(#[from] DataUrlError),

    #[error("failed to write photo: {0}")]
    Io(#[from] io::Error),
}

/// File name for photo `index`: its stored name, else `<album>_<n>.<ext>`,
/// else `photo_<millis>.<ext>`.
pub fn download_file_name(album: &Album, index: usize, mime: &str, now: DateTime<Utc>) -> String {
    let ext = data_url::extension_for_mime(mime);

    if let Some(name) = album.photo_name(index).map(sanitize).filter(|n| !n.is_empty()) {
        return name;
    }
    let album_name = sanitize(&album.name);
    if !album_name.is_empty() {
        return format!("{}_{}.{}", album_name, index + 1, ext);
    }
    format!("photo_{}.{}", now.timestamp_millis(), ext)
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    cleaned.trim().trim_start_matches('.').to_string()
}

/// Write photo `index` of `album` into `dir` and return the written path.
/// Existing files are never overwritten; ` (1)`, ` (2)`, ... is appended to
/// the stem instead.
pub fn download_photo(album: &Album, index: usize, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf, DownloadError> {
    let url = album.photos.get(index).ok_or(DownloadError::NoSuchPhoto {
        index,
        len: album.photos.len(),
    })?;
    let (mime, bytes) = data_url::decode(url)?;
    let name = download_file_name(album, index, &mime, now);

    fs::create_dir_all(dir)?;
    let path = write_new(dir, &name, &bytes)?;
    tracing::info!(album = %album.id, index, path = ?path, bytes = bytes.len(), "Photo downloaded");
    Ok(path)
}

fn write_new(dir: &Path, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    let candidate = Path::new(name);
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string());
    let ext = candidate.extension().map(|e| e.to_string_lossy().to_string());

    for n in 0u32.. {
        let file_name = match (n, &ext) {
            (0, _) => name.to_string(),
            (n, Some(ext)) => format!("{} ({}).{}", stem, n, ext),
            (n, None) => format!("{} ({})", stem, n),
        };
        let path = dir.join(file_name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes)?;
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(io::ErrorKind::AlreadyExists, "no free file name"))
}

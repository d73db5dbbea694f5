//! Limits and validation rules for new albums.

use std::time::Duration;
use thiserror::Error;

use super::candidate::CandidateFile;
use crate::config::IngestConfig;

const MIB: u64 = 1024 * 1024;

/// User-input problems. Shown to the user; nothing is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter an album name")]
    MissingName,

    #[error("Please select a cover image")]
    MissingCover,

    #[error("Please add at least one photo to the album")]
    NoPhotos,

    #[error("Cover image should be less than {}MB", limit / MIB)]
    CoverTooLarge { size: u64, limit: u64 },

    #[error("Cover must be an image file")]
    CoverNotImage,

    #[error("Total photos size should be less than {}MB", limit / MIB)]
    TotalSizeExceeded { total: u64, limit: u64 },

    #[error("You can upload maximum {limit} photos per album")]
    TooManyPhotos { requested: usize, limit: usize },
}

#[derive(Debug, Clone)]
pub struct IngestLimits {
    pub max_total_bytes: u64,
    pub max_photos: usize,
    pub max_cover_bytes: u64,
    pub chunk_threshold: usize,
    pub chunk_size: usize,
    pub chunk_yield: Duration,
    pub conversion_timeout: Duration,
}

impl From<&IngestConfig> for IngestLimits {
    fn from(config: &IngestConfig) -> Self {
        Self {
            max_total_bytes: config.max_total_bytes,
            max_photos: config.max_photos,
            max_cover_bytes: config.max_cover_bytes,
            chunk_threshold: config.chunk_threshold,
            chunk_size: config.chunk_size.max(1),
            chunk_yield: Duration::from_millis(config.chunk_yield_ms),
            conversion_timeout: Duration::from_secs(config.conversion_timeout_secs),
        }
    }
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self::from(&IngestConfig::default())
    }
}

impl IngestLimits {
    /// Split a batch into conversion chunks. Small batches run as one chunk.
    pub fn chunk_len(&self, batch_len: usize) -> usize {
        if batch_len > self.chunk_threshold {
            self.chunk_size
        } else {
            batch_len.max(1)
        }
    }
}

/// Drop non-image files. They are not counted as errors.
pub fn accept_images(files: Vec<CandidateFile>) -> Vec<CandidateFile> {
    files.into_iter().filter(CandidateFile::is_image).collect()
}

/// Whole-batch checks. Either every file is accepted or none is.
pub fn validate_batch(
    files: &[CandidateFile],
    already_selected: usize,
    limits: &IngestLimits,
) -> Result<(), ValidationError> {
    let total: u64 = files.iter().map(|f| f.size).sum();
    if total > limits.max_total_bytes {
        return Err(ValidationError::TotalSizeExceeded {
            total,
            limit: limits.max_total_bytes,
        });
    }

    let requested = already_selected + files.len();
    if requested > limits.max_photos {
        return Err(ValidationError::TooManyPhotos {
            requested,
            limit: limits.max_photos,
        });
    }

    Ok(())
}

pub fn validate_cover(file: &CandidateFile, limits: &IngestLimits) -> Result<(), ValidationError> {
    if !file.is_image() {
        return Err(ValidationError::CoverNotImage);
    }
    if file.size > limits.max_cover_bytes {
        return Err(ValidationError::CoverTooLarge {
            size: file.size,
            limit: limits.max_cover_bytes,
        });
    }
    Ok(())
}

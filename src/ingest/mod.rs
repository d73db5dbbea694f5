//! Turning user-selected files into a new album.
//!
//! An [`IngestSession`] holds the working selection of the create form. Files
//! are validated as a batch, converted off the UI loop (see [`convert`]) and
//! only then added to the selection. Nothing touches the store until
//! [`IngestSession::commit`].

pub mod candidate;
pub mod convert;
pub mod validate;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use candidate::{expand_inputs, parse_path_list, CandidateFile};
pub use convert::{convert_batch, convert_file, ConvertedPhoto};
pub use validate::{accept_images, validate_batch, validate_cover, IngestLimits, ValidationError};

use crate::album::{Album, AlbumId};
use crate::store::{AlbumStore, StoreError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to read {name}: {reason}")]
    ConversionFailed { name: String, reason: String },

    #[error("Import cancelled")]
    Cancelled,

    #[error("Photos are still loading")]
    Busy,

    #[error("Cover is still loading")]
    CoverLoading,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestState {
    #[default]
    Idle,
    ValidatingInputs,
    ConvertingFiles,
    AwaitingBatchCompletion,
    Committing,
}

impl IngestState {
    pub fn is_busy(&self) -> bool {
        !matches!(self, IngestState::Idle)
    }
}

/// A validated batch ready for conversion. `generation` ties the result back
/// to the form it was started from.
#[derive(Debug)]
pub struct PreparedBatch {
    pub generation: u64,
    pub files: Vec<CandidateFile>,
}

pub struct IngestSession {
    limits: IngestLimits,
    state: IngestState,
    cover: Option<ConvertedPhoto>,
    photos: Vec<ConvertedPhoto>,
    /// Generation of a cover conversion still in flight.
    cover_pending: Option<u64>,
    generation: u64,
}

impl IngestSession {
    pub fn new(limits: IngestLimits) -> Self {
        Self {
            limits,
            state: IngestState::Idle,
            cover: None,
            photos: Vec::new(),
            cover_pending: None,
            generation: 0,
        }
    }

    pub fn limits(&self) -> &IngestLimits {
        &self.limits
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    pub fn photos(&self) -> &[ConvertedPhoto] {
        &self.photos
    }

    pub fn cover(&self) -> Option<&ConvertedPhoto> {
        self.cover.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cover_loading(&self) -> bool {
        self.cover_pending == Some(self.generation)
    }

    /// Drop non-images, then check the whole batch against the limits.
    ///
    /// Returns `Ok(None)` when nothing in the batch is an image.
    pub fn prepare_batch(&mut self, files: Vec<CandidateFile>) -> Result<Option<PreparedBatch>, IngestError> {
        if self.state.is_busy() {
            return Err(IngestError::Busy);
        }
        self.state = IngestState::ValidatingInputs;

        let offered = files.len();
        let files = accept_images(files);
        if files.len() < offered {
            tracing::debug!(skipped = offered - files.len(), "Ignoring non-image files");
        }
        if files.is_empty() {
            self.state = IngestState::Idle;
            return Ok(None);
        }

        if let Err(e) = validate_batch(&files, self.photos.len(), &self.limits) {
            self.state = IngestState::Idle;
            tracing::info!(error = %e, "Photo batch rejected");
            return Err(e.into());
        }

        self.state = IngestState::ConvertingFiles;
        Ok(Some(PreparedBatch {
            generation: self.generation,
            files,
        }))
    }

    /// All conversions of the batch are in flight.
    pub fn mark_dispatched(&mut self) {
        if self.state == IngestState::ConvertingFiles {
            self.state = IngestState::AwaitingBatchCompletion;
        }
    }

    /// Append a finished batch. Results from a form that has since been
    /// cleared are dropped and `0` is returned.
    pub fn accept_batch(&mut self, generation: u64, converted: Vec<ConvertedPhoto>) -> usize {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "Dropping stale photo batch");
            return 0;
        }
        let added = converted.len();
        self.photos.extend(converted);
        self.state = IngestState::Idle;
        added
    }

    pub fn fail_batch(&mut self, generation: u64) {
        if generation == self.generation {
            self.state = IngestState::Idle;
        }
    }

    /// Validate a cover file. Until [`set_cover`](Self::set_cover) or
    /// [`fail_cover`](Self::fail_cover) is called for the returned batch,
    /// the session refuses to commit.
    pub fn prepare_cover(&mut self, file: CandidateFile) -> Result<PreparedBatch, IngestError> {
        if self.is_cover_loading() {
            return Err(IngestError::CoverLoading);
        }
        validate_cover(&file, &self.limits)?;
        self.cover_pending = Some(self.generation);
        Ok(PreparedBatch {
            generation: self.generation,
            files: vec![file],
        })
    }

    pub fn set_cover(&mut self, generation: u64, cover: ConvertedPhoto) -> bool {
        if generation != self.generation {
            return false;
        }
        self.cover_pending = None;
        self.cover = Some(cover);
        true
    }

    pub fn fail_cover(&mut self, generation: u64) {
        if self.cover_pending == Some(generation) {
            self.cover_pending = None;
        }
    }

    /// Take a photo back out of the working selection.
    pub fn remove_photo(&mut self, index: usize) -> Option<ConvertedPhoto> {
        (index < self.photos.len()).then(|| self.photos.remove(index))
    }

    /// Build the album and insert it into `store`. On success the working
    /// selection is cleared; on error it is kept so the user can fix the
    /// form.
    pub fn commit(
        &mut self,
        store: &mut AlbumStore,
        name: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<AlbumId, IngestError> {
        if self.state.is_busy() {
            return Err(IngestError::Busy);
        }
        if self.is_cover_loading() {
            return Err(IngestError::CoverLoading);
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName.into());
        }
        let cover = match (&self.cover, self.photos.first()) {
            (Some(cover), _) => cover.data_url.clone(),
            (None, Some(first)) => first.data_url.clone(),
            (None, None) => return Err(ValidationError::MissingCover.into()),
        };
        if self.photos.is_empty() {
            return Err(ValidationError::NoPhotos.into());
        }

        self.state = IngestState::Committing;
        let description = description.trim();
        let album = Album {
            id: store.allocate_id(now),
            name: name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            cover,
            photos: self.photos.iter().map(|p| p.data_url.clone()).collect(),
            photo_names: Some(self.photos.iter().map(|p| p.name.clone()).collect()),
            created_at: now,
        };
        let id = album.id.clone();

        if let Err(e) = store.insert(album) {
            self.state = IngestState::Idle;
            return Err(e.into());
        }

        self.clear();
        Ok(id)
    }

    /// Reset the form. Batches still converting for the old form are
    /// ignored when they finish.
    pub fn clear(&mut self) {
        self.cover = None;
        self.cover_pending = None;
        self.photos.clear();
        self.state = IngestState::Idle;
        self.generation += 1;
    }

    /// Validate, convert and append `files` in one step.
    pub async fn add_photos(&mut self, files: Vec<CandidateFile>) -> Result<usize, IngestError> {
        let Some(batch) = self.prepare_batch(files)? else {
            return Ok(0);
        };
        self.mark_dispatched();
        match convert_batch(batch.files, self.limits.clone(), None, None).await {
            Ok(converted) => Ok(self.accept_batch(batch.generation, converted)),
            Err(e) => {
                self.fail_batch(batch.generation);
                Err(e)
            }
        }
    }
}

//! Reading selected files into embedded data URLs.
//!
//! Conversions inside a chunk complete in any order; results are written back
//! by input index so the returned batch always matches the selection order.
//! The batch resolves only after every conversion has finished.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};

use super::candidate::CandidateFile;
use super::validate::IngestLimits;
use super::IngestError;
use crate::data_url;
use crate::tasks::{TaskProgress, TaskUpdate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedPhoto {
    pub name: String,
    pub data_url: String,
    pub size: u64,
}

pub async fn convert_file(file: &CandidateFile, timeout: Duration) -> Result<ConvertedPhoto, IngestError> {
    let read = tokio::time::timeout(timeout, tokio::fs::read(&file.path)).await;
    let bytes = match read {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            return Err(IngestError::ConversionFailed {
                name: file.name.clone(),
                reason: e.to_string(),
            })
        }
        Err(_) => {
            return Err(IngestError::ConversionFailed {
                name: file.name.clone(),
                reason: format!("timed out after {}s", timeout.as_secs()),
            })
        }
    };

    let mime = file.mime.unwrap_or("image/jpeg");
    Ok(ConvertedPhoto {
        name: file.name.clone(),
        data_url: data_url::encode(mime, &bytes),
        size: bytes.len() as u64,
    })
}

/// Convert a whole batch, publishing progress after every file.
///
/// Large batches are split into chunks with a pause between them so the UI
/// keeps redrawing. The first failed conversion fails the batch.
pub async fn convert_batch(
    files: Vec<CandidateFile>,
    limits: IngestLimits,
    progress: Option<mpsc::Sender<TaskUpdate>>,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<Vec<ConvertedPhoto>, IngestError> {
    let total = files.len();
    let publish = |update: TaskUpdate| {
        if let Some(tx) = &progress {
            let _ = tx.send(update);
        }
    };
    let cancelled = || cancel.as_ref().is_some_and(|c| c.load(Ordering::SeqCst));

    publish(TaskUpdate::Started { total });

    let chunk_len = limits.chunk_len(total);
    let mut results: Vec<Option<ConvertedPhoto>> = (0..total).map(|_| None).collect();
    let mut processed = 0usize;

    for (chunk_index, chunk) in files.chunks(chunk_len).enumerate() {
        if chunk_index > 0 && !limits.chunk_yield.is_zero() {
            tokio::time::sleep(limits.chunk_yield).await;
        }
        if cancelled() {
            publish(TaskUpdate::Cancelled);
            return Err(IngestError::Cancelled);
        }

        let base = chunk_index * chunk_len;
        let timeout = limits.conversion_timeout;
        let mut pending: FuturesUnordered<_> = chunk
            .iter()
            .enumerate()
            .map(|(offset, file)| async move { (base + offset, convert_file(file, timeout).await) })
            .collect();

        while let Some((index, result)) = pending.next().await {
            let photo = match result {
                Ok(photo) => photo,
                Err(e) => {
                    publish(TaskUpdate::Failed { error: e.to_string() });
                    return Err(e);
                }
            };
            processed += 1;
            publish(TaskUpdate::Progress(
                TaskProgress::new(processed, total).with_item(photo.name.clone()),
            ));
            results[index] = Some(photo);
        }
    }

    tracing::debug!(files = total, "Batch conversion finished");
    publish(TaskUpdate::Completed {
        message: format!("Loaded {} photo{}", total, if total == 1 { "" } else { "s" }),
    });
    Ok(results.into_iter().flatten().collect())
}

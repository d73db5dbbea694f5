//! Embedded image references (`data:<mime>;base64,<payload>`).

use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataUrlError {
    #[error("not a data URL")]
    NotDataUrl,
    #[error("data URL is not base64 encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a data URL into its MIME type and decoded bytes.
pub fn decode(url: &str) -> Result<(String, Vec<u8>), DataUrlError> {
    let rest = url.strip_prefix("data:").ok_or(DataUrlError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::NotDataUrl)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(DataUrlError::NotBase64)?;
    let bytes = STANDARD.decode(payload.trim())?;
    Ok((mime.to_string(), bytes))
}

/// MIME type of a data URL without decoding the payload.
pub fn mime_of(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("data:")?;
    let header = rest.split(',').next()?;
    Some(header.split(';').next().unwrap_or(header))
}

/// Decoded size of the payload, computed from the base64 length.
pub fn payload_len(url: &str) -> usize {
    let Some((_, payload)) = url.split_once(',') else {
        return 0;
    };
    let padding = payload.bytes().rev().take_while(|b| *b == b'=').count();
    (payload.len() / 4 * 3).saturating_sub(padding)
}

pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/svg+xml" => "svg",
        "image/avif" => "avif",
        "image/heic" => "heic",
        "image/heif" => "heif",
        "image/tiff" => "tiff",
        _ => "jpg",
    }
}

//! Image codec - source byte reads and the persisted encoding
//!
//! Image charts arrive as a filesystem path; what gets stored is a
//! reversible base64 rendition of the raw bytes, so the original file can
//! be reconstructed bit-for-bit from the document alone.

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::io::ErrorKind;
use std::path::Path;

/// Read the raw bytes of a source image.
///
/// # Errors
///
/// Returns [`Error::ImageSourceMissing`] (stable message) when the path
/// does not exist; other IO failures propagate as [`Error::Io`] so a
/// permission problem is not misreported as a missing file.
pub async fn read_source(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    match tokio::fs::read(path.as_ref()).await {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(Error::ImageSourceMissing),
        Err(err) => Err(Error::Io(err)),
    }
}

/// Encode raw bytes into the persisted text form.
#[must_use]
pub fn to_persisted_form(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode the persisted text form back into raw bytes.
///
/// Inverse of [`to_persisted_form`]:
/// `from_persisted_form(&to_persisted_form(b)) == b` for all byte strings.
///
/// # Errors
///
/// Returns [`Error::InvalidEncodedImage`] if the payload is not valid
/// base64.
pub fn from_persisted_form(encoded: &str) -> Result<Vec<u8>> {
    Ok(BASE64.decode(encoded)?)
}

// SPDX-License-Identifier: MIT

//! Uploaded file record and its lifecycle states.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Accepted upload formats, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Fit,
    Tcx,
}

impl FileFormat {
    /// Determine the format from a filename extension (case-insensitive).
    /// Returns `None` for anything other than `.fit` / `.tcx`.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.').map(|(_, e)| e.to_lowercase())?;
        match ext.as_str() {
            "fit" => Some(Self::Fit),
            "tcx" => Some(Self::Tcx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::Tcx => "tcx",
        }
    }
}

/// Upload lifecycle: `uploaded -> parsed -> matched` (terminal success)
/// or `uploaded -> error` (terminal failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploaded,
    Parsed,
    Matched,
    Error,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Parsed => "parsed",
            Self::Matched => "matched",
            Self::Error => "error",
        }
    }
}

/// Stored upload record in Firestore.
///
/// The document ID is `{user_id}_{sha256}`, so `(owner, hash)` uniqueness
/// is enforced by the storage layer: a create-only write of the same
/// bytes by the same user can never produce a second document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Document ID (deterministic, see above)
    pub id: String,
    /// Owner user ID
    pub user_id: String,
    /// Original filename as uploaded
    pub filename: String,
    /// Upload format
    pub format: FileFormat,
    /// Size of the uploaded bytes
    pub size_bytes: u64,
    /// SHA-256 hex digest of the exact uploaded byte sequence
    pub sha256: String,
    /// Lifecycle status
    pub status: UploadStatus,
    /// Human-readable parse failure reason, if status is `error`
    pub error_message: Option<String>,
    /// Raw uploaded bytes, base64-encoded
    pub raw_file_base64: String,
    /// When the upload was received
    pub created_at: DateTime<Utc>,
}

impl UploadedFile {
    /// Deterministic document ID for an `(owner, hash)` pair.
    pub fn document_id(user_id: &str, sha256: &str) -> String {
        format!("{}_{}", user_id, sha256)
    }

    /// Build a fresh upload record (status `uploaded`) from raw bytes.
    pub fn new(user_id: &str, filename: &str, format: FileFormat, bytes: &[u8]) -> Self {
        let sha256 = sha256_hex(bytes);
        Self {
            id: Self::document_id(user_id, &sha256),
            user_id: user_id.to_string(),
            filename: filename.to_string(),
            format,
            size_bytes: bytes.len() as u64,
            sha256,
            status: UploadStatus::Uploaded,
            error_message: None,
            raw_file_base64: STANDARD.encode(bytes),
            created_at: Utc::now(),
        }
    }
}

/// SHA-256 hex digest over an exact byte sequence (the dedup hash).
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(FileFormat::from_filename("ride.fit"), Some(FileFormat::Fit));
        assert_eq!(FileFormat::from_filename("RUN.TCX"), Some(FileFormat::Tcx));
        assert_eq!(FileFormat::from_filename("track.gpx"), None);
        assert_eq!(FileFormat::from_filename("noextension"), None);
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_identical_bytes_same_document_id() {
        let a = UploadedFile::new("user-1", "morning.fit", FileFormat::Fit, b"payload");
        let b = UploadedFile::new("user-1", "renamed.fit", FileFormat::Fit, b"payload");
        assert_eq!(a.id, b.id);

        // Different owner, same bytes: distinct documents.
        let c = UploadedFile::new("user-2", "morning.fit", FileFormat::Fit, b"payload");
        assert_ne!(a.id, c.id);
    }
}

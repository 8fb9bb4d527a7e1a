use std::collections::BTreeMap;
use std::sync::Mutex;

use mime::Mime;
use serde::{Deserialize, Serialize};

use super::domain::{EvidenceRef, ViolationId};

pub const DEFAULT_MAX_EVIDENCE_BYTES: usize = 5 * 1024 * 1024;

/// Raw upload as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Upload that passed type and size checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEvidence {
    pub content_type: Mime,
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvidenceError {
    #[error("evidence upload is empty")]
    Empty,
    #[error("evidence type '{content_type}' is not accepted (jpeg, png, gif, or pdf)")]
    UnsupportedType { content_type: String },
    #[error("evidence is {size} bytes; the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("evidence store unavailable: {0}")]
    Store(String),
}

/// Admits JPEG, PNG, GIF, and PDF uploads up to a byte limit.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceValidator {
    max_bytes: usize,
}

impl Default for EvidenceValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EVIDENCE_BYTES)
    }
}

impl EvidenceValidator {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn validate(&self, upload: EvidenceUpload) -> Result<ValidatedEvidence, EvidenceError> {
        if upload.bytes.is_empty() {
            return Err(EvidenceError::Empty);
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(EvidenceError::TooLarge {
                size: upload.bytes.len(),
                max: self.max_bytes,
            });
        }

        let unsupported = || EvidenceError::UnsupportedType {
            content_type: upload.content_type.clone(),
        };
        let content_type: Mime = upload.content_type.trim().parse().map_err(|_| unsupported())?;
        let extension = extension_for(&content_type).ok_or_else(unsupported)?;

        Ok(ValidatedEvidence {
            content_type,
            extension,
            bytes: upload.bytes,
        })
    }
}

fn extension_for(content_type: &Mime) -> Option<&'static str> {
    let essence = content_type.essence_str();
    if essence == mime::IMAGE_JPEG.essence_str() {
        Some("jpg")
    } else if essence == mime::IMAGE_PNG.essence_str() {
        Some("png")
    } else if essence == mime::IMAGE_GIF.essence_str() {
        Some("gif")
    } else if essence == mime::APPLICATION_PDF.essence_str() {
        Some("pdf")
    } else {
        None
    }
}

/// Persists validated evidence and hands back a stable reference.
pub trait EvidenceStore: Send + Sync {
    fn store(
        &self,
        violation_id: ViolationId,
        evidence: ValidatedEvidence,
    ) -> Result<EvidenceRef, EvidenceError>;
}

#[derive(Debug, Default)]
struct StoredFiles {
    files: BTreeMap<String, (Mime, Vec<u8>)>,
    uploads: u64,
}

/// Keeps evidence bytes in memory, keyed by reference.
#[derive(Debug, Default)]
pub struct MemoryEvidenceStore {
    inner: Mutex<StoredFiles>,
}

impl MemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch(&self, reference: &EvidenceRef) -> Option<(Mime, Vec<u8>)> {
        self.inner
            .lock()
            .ok()
            .and_then(|stored| stored.files.get(&reference.0).cloned())
    }
}

impl EvidenceStore for MemoryEvidenceStore {
    fn store(
        &self,
        violation_id: ViolationId,
        evidence: ValidatedEvidence,
    ) -> Result<EvidenceRef, EvidenceError> {
        let mut stored = self
            .inner
            .lock()
            .map_err(|_| EvidenceError::Store("evidence lock poisoned".to_string()))?;
        stored.uploads += 1;
        let key = format!(
            "violation_evidence/evidence_{}_{}.{}",
            violation_id, stored.uploads, evidence.extension
        );
        stored
            .files
            .insert(key.clone(), (evidence.content_type, evidence.bytes));
        Ok(EvidenceRef(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, size: usize) -> EvidenceUpload {
        EvidenceUpload {
            file_name: "exit-photo".to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0xAB; size],
        }
    }

    #[test]
    fn accepts_supported_types() {
        let validator = EvidenceValidator::default();
        for (content_type, extension) in [
            ("image/jpeg", "jpg"),
            ("image/png", "png"),
            ("image/gif", "gif"),
            ("application/pdf", "pdf"),
        ] {
            let validated = validator
                .validate(upload(content_type, 16))
                .expect("supported type");
            assert_eq!(validated.extension, extension);
        }
    }

    #[test]
    fn rejects_other_types_and_oversized_files() {
        let validator = EvidenceValidator::new(32);
        assert!(matches!(
            validator.validate(upload("text/plain", 8)),
            Err(EvidenceError::UnsupportedType { .. })
        ));
        assert!(matches!(
            validator.validate(upload("not a mime", 8)),
            Err(EvidenceError::UnsupportedType { .. })
        ));
        assert_eq!(
            validator.validate(upload("image/png", 33)),
            Err(EvidenceError::TooLarge { size: 33, max: 32 })
        );
        assert_eq!(
            validator.validate(upload("image/png", 0)),
            Err(EvidenceError::Empty)
        );
    }

    #[test]
    fn memory_store_issues_sequential_references() {
        let store = MemoryEvidenceStore::new();
        let validator = EvidenceValidator::default();
        let first = store
            .store(
                ViolationId(4),
                validator.validate(upload("image/jpeg", 4)).expect("valid"),
            )
            .expect("stored");
        let second = store
            .store(
                ViolationId(4),
                validator
                    .validate(upload("application/pdf", 4))
                    .expect("valid"),
            )
            .expect("stored");

        assert_eq!(first.0, "violation_evidence/evidence_4_1.jpg");
        assert_eq!(second.0, "violation_evidence/evidence_4_2.pdf");
        let (content_type, bytes) = store.fetch(&first).expect("bytes kept");
        assert_eq!(content_type, mime::IMAGE_JPEG);
        assert_eq!(bytes.len(), 4);
    }
}

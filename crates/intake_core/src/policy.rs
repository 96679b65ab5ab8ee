use std::path::{Path, PathBuf};

use crate::WorkflowError;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// 5 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// A file offered to the workflow by drag-and-drop or the file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Where a real transport reads the bytes from.
    pub path: PathBuf,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            name,
            mime_type: mime_type.into(),
            size,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }
}

/// Accepted media types and size ceiling for uploaded documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub accepted_mime_types: Vec<String>,
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            accepted_mime_types: vec![
                MIME_PDF.to_string(),
                MIME_DOC.to_string(),
                MIME_DOCX.to_string(),
            ],
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    /// Type is checked before size, so an oversized PNG reports the type.
    pub fn check(&self, file: &FileCandidate) -> Result<(), WorkflowError> {
        if !self.accepts_mime(&file.mime_type) {
            return Err(WorkflowError::InvalidFileType {
                mime_type: file.mime_type.clone(),
            });
        }
        if file.size > self.max_bytes {
            return Err(WorkflowError::FileTooLarge {
                size: file.size,
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }

    pub fn accepts_mime(&self, mime_type: &str) -> bool {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or(mime_type)
            .trim();
        !essence.is_empty()
            && self
                .accepted_mime_types
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(essence))
    }
}

/// Maps the file-picker extensions (`.pdf`, `.doc`, `.docx`) to their media type.
pub fn mime_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(MIME_PDF),
        "doc" => Some(MIME_DOC),
        "docx" => Some(MIME_DOCX),
        _ => None,
    }
}

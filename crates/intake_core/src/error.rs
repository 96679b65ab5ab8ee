use thiserror::Error;

use crate::Notification;

/// Recoverable failures of the upload and submission workflow.
///
/// None of these are fatal: each maps to a notification and leaves the form in
/// a well-defined state (`Idle` for rejected files, `Error` for failed
/// transfers, `Editing` for refused submissions).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("unsupported file type {mime_type:?}")]
    InvalidFileType { mime_type: String },
    #[error("file is {size} bytes, limit is {max_bytes}")]
    FileTooLarge { size: u64, max_bytes: u64 },
    #[error("a resume must be uploaded before submitting")]
    MissingResume,
    #[error("upload failed: {reason}")]
    UploadFailed { reason: String },
    #[error("required field {field} is empty")]
    MissingField { field: String },
    #[error("field {field} is invalid: {reason}")]
    InvalidField { field: String, reason: String },
    #[error("submission failed: {reason}")]
    SubmissionFailed { reason: String },
}

impl WorkflowError {
    pub fn notification(&self) -> Notification {
        match self {
            WorkflowError::InvalidFileType { .. } => Notification::destructive(
                "Invalid file type",
                "Please upload a PDF or Word document.",
            ),
            WorkflowError::FileTooLarge { max_bytes, .. } => Notification::destructive(
                "File too large",
                format!(
                    "Please upload a file smaller than {}MB.",
                    max_bytes / (1024 * 1024)
                ),
            ),
            WorkflowError::MissingResume => Notification::destructive(
                "Resume required",
                "Please upload your resume before submitting.",
            ),
            WorkflowError::UploadFailed { .. } => {
                Notification::destructive("Upload failed", "Please try again.")
            }
            WorkflowError::MissingField { field } => Notification::destructive(
                "Missing information",
                format!("Please fill in the {field} field."),
            ),
            WorkflowError::InvalidField { reason, .. } => {
                Notification::destructive("Invalid information", reason.clone())
            }
            WorkflowError::SubmissionFailed { .. } => Notification::destructive(
                "Submission failed",
                "Something went wrong. Please try again.",
            ),
        }
    }
}

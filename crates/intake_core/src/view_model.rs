use crate::{FormData, FormKind, SubmissionPhase, UploadStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormViewModel {
    pub kind: FormKind,
    pub upload_status: UploadStatus,
    pub progress: u8,
    pub file_name: String,
    pub phase: SubmissionPhase,
    pub fields: FormData,
    /// Mirrors the enabled state of the submit button.
    pub can_submit: bool,
    pub dirty: bool,
}

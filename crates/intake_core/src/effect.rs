use serde::Serialize;

use crate::{FileCandidate, FormData, FormKind, Notification, SubmissionId, UploadId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartUpload {
        upload_id: UploadId,
        file: FileCandidate,
    },
    CancelUpload {
        upload_id: UploadId,
    },
    Submit {
        submission_id: SubmissionId,
        submission: Submission,
    },
    /// Deliver `Msg::ResetElapsed` once the reset delay has passed.
    ScheduleReset {
        submission_id: SubmissionId,
    },
    Notify(Notification),
}

/// Payload handed to the submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub kind: FormKind,
    pub fields: FormData,
    pub file: Option<FileReference>,
}

/// The accepted upload as the endpoint sees it; local paths stay local.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

impl From<&FileCandidate> for FileReference {
    fn from(file: &FileCandidate) -> Self {
        Self {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
        }
    }
}

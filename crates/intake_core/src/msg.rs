use crate::{FileCandidate, SubmissionId, UploadId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited a text field.
    FieldChanged { name: String, value: String },
    /// User dropped or browsed a file.
    FileSelected(FileCandidate),
    /// Transport progress for an upload, in percent.
    UploadProgress { upload_id: UploadId, percent: u8 },
    /// Transport reached a terminal result.
    UploadFinished {
        upload_id: UploadId,
        outcome: UploadOutcome,
    },
    /// "Try Again" on a failed upload.
    RetryClicked,
    /// "Change" on an uploaded file.
    ChangeFileClicked,
    SubmitClicked,
    /// Submission endpoint answered.
    SubmissionFinished {
        submission_id: SubmissionId,
        outcome: SubmissionOutcome,
    },
    /// The post-submit display delay elapsed.
    ResetElapsed { submission_id: SubmissionId },
    /// "Submit another" on the thank-you panel.
    DismissClicked,
    /// The form left the screen; nothing may touch it afterwards.
    Unmounted,
    /// Fallback for placeholder wiring.
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Completed,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted,
    Rejected { reason: String },
}

//! Intake core: pure upload/submission state machine and view-model helpers.
mod effect;
mod error;
mod form;
mod msg;
mod notification;
mod policy;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, FileReference, Submission};
pub use error::WorkflowError;
pub use form::{AfterSubmit, FormData, FormKind};
pub use msg::{Msg, SubmissionOutcome, UploadOutcome};
pub use notification::{Notification, Severity};
pub use policy::{
    mime_for_extension, FileCandidate, UploadPolicy, MAX_UPLOAD_BYTES, MIME_DOC, MIME_DOCX,
    MIME_PDF,
};
pub use state::{FormState, SubmissionId, SubmissionPhase, UploadId, UploadState, UploadStatus};
pub use update::update;
pub use view_model::FormViewModel;

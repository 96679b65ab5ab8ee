use crate::view_model::FormViewModel;
use crate::{FileCandidate, FileReference, FormData, FormKind, Submission, UploadPolicy};

pub type UploadId = u64;
pub type SubmissionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Success,
    Error,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Error)
    }
}

/// Lifecycle of the single document attached to a form.
///
/// Fields are only mutated through the crate's transition helpers, so
/// `Success` can never be observed without a preceding `Uploading`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadState {
    status: UploadStatus,
    progress: u8,
    file_name: String,
}

impl UploadState {
    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    fn begin(&mut self, file_name: &str) {
        self.status = UploadStatus::Uploading;
        self.progress = 0;
        self.file_name = file_name.to_string();
    }

    /// Returns true when the value changed. Reaching 100 completes the upload.
    fn advance(&mut self, percent: u8) -> bool {
        let percent = percent.min(100);
        if self.status != UploadStatus::Uploading || percent <= self.progress {
            return false;
        }
        self.progress = percent;
        if percent == 100 {
            self.status = UploadStatus::Success;
        }
        true
    }

    fn complete(&mut self) {
        self.progress = 100;
        self.status = UploadStatus::Success;
    }

    fn fail(&mut self) {
        self.status = UploadStatus::Error;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Editing,
    Submitting,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    kind: FormKind,
    policy: UploadPolicy,
    fields: FormData,
    upload: UploadState,
    accepted_file: Option<FileCandidate>,
    active_upload: Option<UploadId>,
    last_upload_id: UploadId,
    phase: SubmissionPhase,
    pending_submission: Option<SubmissionId>,
    last_submission_id: SubmissionId,
    mounted: bool,
    dirty: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new(FormKind::Resume)
    }
}

impl FormState {
    pub fn new(kind: FormKind) -> Self {
        Self::with_policy(kind, UploadPolicy::default())
    }

    pub fn with_policy(kind: FormKind, policy: UploadPolicy) -> Self {
        Self {
            kind,
            policy,
            fields: FormData::new(),
            upload: UploadState::default(),
            accepted_file: None,
            active_upload: None,
            last_upload_id: 0,
            phase: SubmissionPhase::Editing,
            pending_submission: None,
            last_submission_id: 0,
            mounted: true,
            dirty: false,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn fields(&self) -> &FormData {
        &self.fields
    }

    pub fn upload(&self) -> &UploadState {
        &self.upload
    }

    pub fn accepted_file(&self) -> Option<&FileCandidate> {
        self.accepted_file.as_ref()
    }

    /// Id of the upload whose events are currently honoured.
    pub fn active_upload(&self) -> Option<UploadId> {
        self.active_upload
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn pending_submission(&self) -> Option<SubmissionId> {
        self.pending_submission
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn view(&self) -> FormViewModel {
        FormViewModel {
            kind: self.kind,
            upload_status: self.upload.status,
            progress: self.upload.progress,
            file_name: self.upload.file_name.clone(),
            phase: self.phase,
            fields: self.fields.clone(),
            can_submit: self.can_submit(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything observable changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn can_submit(&self) -> bool {
        self.phase == SubmissionPhase::Editing
            && (!self.kind.requires_upload() || self.upload.status == UploadStatus::Success)
    }

    pub(crate) fn set_field(&mut self, name: String, value: String) {
        if self.fields.get(&name) != Some(value.as_str()) {
            self.fields.set(name, value);
            self.dirty = true;
        }
    }

    pub(crate) fn begin_upload(&mut self, file: FileCandidate) -> UploadId {
        self.last_upload_id += 1;
        self.upload.begin(&file.name);
        self.accepted_file = Some(file);
        self.active_upload = Some(self.last_upload_id);
        self.dirty = true;
        self.last_upload_id
    }

    pub(crate) fn advance_upload(&mut self, percent: u8) {
        if self.upload.advance(percent) {
            if self.upload.status.is_terminal() {
                self.active_upload = None;
            }
            self.dirty = true;
        }
    }

    pub(crate) fn complete_upload(&mut self) {
        self.upload.complete();
        self.active_upload = None;
        self.dirty = true;
    }

    pub(crate) fn fail_upload(&mut self) {
        self.upload.fail();
        self.accepted_file = None;
        self.active_upload = None;
        self.dirty = true;
    }

    /// Back to `Idle`; returns the in-flight upload, if any, so it can be cancelled.
    pub(crate) fn reset_upload(&mut self) -> Option<UploadId> {
        self.upload = UploadState::default();
        self.accepted_file = None;
        self.dirty = true;
        self.active_upload.take()
    }

    pub(crate) fn begin_submission(&mut self) -> (SubmissionId, Submission) {
        self.last_submission_id += 1;
        self.phase = SubmissionPhase::Submitting;
        self.pending_submission = Some(self.last_submission_id);
        self.dirty = true;
        let file = match self.upload.status {
            UploadStatus::Success => self.accepted_file.as_ref().map(FileReference::from),
            _ => None,
        };
        let submission = Submission {
            kind: self.kind,
            fields: self.fields.clone(),
            file,
        };
        (self.last_submission_id, submission)
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.phase = SubmissionPhase::Submitted;
        self.dirty = true;
    }

    pub(crate) fn abort_submission(&mut self) {
        self.phase = SubmissionPhase::Editing;
        self.pending_submission = None;
        self.dirty = true;
    }

    /// Empty fields and a fresh upload, as if the form had just mounted.
    pub(crate) fn reset_form(&mut self) -> Option<UploadId> {
        self.fields = FormData::new();
        self.phase = SubmissionPhase::Editing;
        self.pending_submission = None;
        self.reset_upload()
    }

    pub(crate) fn unmount(&mut self) -> Option<UploadId> {
        self.mounted = false;
        self.dirty = true;
        self.active_upload.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_never_moves_backwards() {
        let mut upload = UploadState::default();
        upload.begin("cv.pdf");
        assert!(upload.advance(40));
        assert!(!upload.advance(35));
        assert!(!upload.advance(40));
        assert_eq!(upload.progress(), 40);
        assert_eq!(upload.status(), UploadStatus::Uploading);
    }

    #[test]
    fn progress_is_clamped_and_completes_at_100() {
        let mut upload = UploadState::default();
        upload.begin("cv.pdf");
        assert!(upload.advance(250));
        assert_eq!(upload.progress(), 100);
        assert_eq!(upload.status(), UploadStatus::Success);
        assert!(!upload.advance(100));
    }

    #[test]
    fn advance_is_ignored_outside_uploading() {
        let mut upload = UploadState::default();
        assert!(!upload.advance(50));
        assert_eq!(upload, UploadState::default());
    }

    #[test]
    fn upload_ids_are_never_reused() {
        let mut state = FormState::new(FormKind::Resume);
        let first = state.begin_upload(FileCandidate::new("a.pdf", crate::MIME_PDF, 10));
        state.reset_upload();
        let second = state.begin_upload(FileCandidate::new("b.pdf", crate::MIME_PDF, 10));
        assert!(second > first);
    }
}

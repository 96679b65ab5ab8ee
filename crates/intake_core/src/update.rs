use crate::{
    AfterSubmit, Effect, FileCandidate, FormState, Msg, SubmissionOutcome, SubmissionPhase,
    UploadOutcome, UploadStatus, WorkflowError,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: FormState, msg: Msg) -> (FormState, Vec<Effect>) {
    if !state.is_mounted() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::FieldChanged { name, value } => {
            if state.phase() == SubmissionPhase::Editing
                && state.kind().accepts_field(&name)
            {
                state.set_field(name, value);
            }
            Vec::new()
        }
        Msg::FileSelected(file) => select_file(&mut state, file),
        Msg::UploadProgress { upload_id, percent } => {
            if state.active_upload() == Some(upload_id) {
                state.advance_upload(percent);
            }
            Vec::new()
        }
        Msg::UploadFinished { upload_id, outcome } => {
            if state.active_upload() != Some(upload_id) {
                return (state, Vec::new());
            }
            match outcome {
                UploadOutcome::Completed => {
                    state.complete_upload();
                    Vec::new()
                }
                UploadOutcome::Failed { reason } => {
                    state.fail_upload();
                    vec![Effect::Notify(
                        WorkflowError::UploadFailed { reason }.notification(),
                    )]
                }
            }
        }
        Msg::RetryClicked => {
            if state.upload().status() == UploadStatus::Error {
                state.reset_upload();
            }
            Vec::new()
        }
        Msg::ChangeFileClicked => {
            if state.upload().status() == UploadStatus::Success
                && state.phase() == SubmissionPhase::Editing
            {
                state.reset_upload();
            }
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::SubmissionFinished {
            submission_id,
            outcome,
        } => {
            if state.phase() != SubmissionPhase::Submitting
                || state.pending_submission() != Some(submission_id)
            {
                return (state, Vec::new());
            }
            match outcome {
                SubmissionOutcome::Accepted => {
                    state.mark_submitted();
                    let mut effects = vec![Effect::Notify(state.kind().success_notification())];
                    if state.kind().after_submit() == AfterSubmit::ResetAfterDelay {
                        effects.push(Effect::ScheduleReset { submission_id });
                    }
                    effects
                }
                SubmissionOutcome::Rejected { reason } => {
                    state.abort_submission();
                    vec![Effect::Notify(
                        WorkflowError::SubmissionFailed { reason }.notification(),
                    )]
                }
            }
        }
        Msg::ResetElapsed { submission_id } => {
            if state.phase() == SubmissionPhase::Submitted
                && state.pending_submission() == Some(submission_id)
            {
                reset_form(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::DismissClicked => {
            if state.phase() == SubmissionPhase::Submitted {
                reset_form(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::Unmounted => match state.unmount() {
            Some(upload_id) => vec![Effect::CancelUpload { upload_id }],
            None => Vec::new(),
        },
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn reset_form(state: &mut FormState) -> Vec<Effect> {
    // A job post may still be attaching an optional file when it is accepted.
    match state.reset_form() {
        Some(upload_id) => vec![Effect::CancelUpload { upload_id }],
        None => Vec::new(),
    }
}

fn select_file(state: &mut FormState, file: FileCandidate) -> Vec<Effect> {
    // One upload per form: anything but Idle ignores new files.
    if state.upload().status() != UploadStatus::Idle
        || state.phase() != SubmissionPhase::Editing
    {
        return Vec::new();
    }
    if let Err(err) = state.policy().check(&file) {
        return vec![Effect::Notify(err.notification())];
    }
    let upload_id = state.begin_upload(file.clone());
    vec![Effect::StartUpload { upload_id, file }]
}

fn submit(state: &mut FormState) -> Vec<Effect> {
    if state.phase() != SubmissionPhase::Editing {
        return Vec::new();
    }
    if state.kind().requires_upload() && state.upload().status() != UploadStatus::Success {
        return vec![Effect::Notify(WorkflowError::MissingResume.notification())];
    }
    if let Err(err) = state.kind().check_fields(state.fields()) {
        return vec![Effect::Notify(err.notification())];
    }
    let (submission_id, submission) = state.begin_submission();
    vec![Effect::Submit {
        submission_id,
        submission,
    }]
}

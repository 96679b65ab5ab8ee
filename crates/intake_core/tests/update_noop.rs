use intake_core::{update, FormKind, FormState, Msg};

#[test]
fn update_is_noop() {
    let state = FormState::new(FormKind::Resume);
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn fresh_form_is_idle_and_blocks_resume_submission() {
    let view = FormState::new(FormKind::Resume).view();
    assert_eq!(view.upload_status, intake_core::UploadStatus::Idle);
    assert_eq!(view.progress, 0);
    assert!(view.file_name.is_empty());
    assert!(!view.can_submit);
    assert!(!view.dirty);

    assert!(FormState::new(FormKind::Contact).view().can_submit);
}

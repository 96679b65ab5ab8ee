use intake_core::{FormViewModel, SubmissionPhase, UploadStatus};

const BAR_WIDTH: usize = 20;

/// One status line per observable change.
pub fn render(view: &FormViewModel) -> String {
    match view.phase {
        SubmissionPhase::Submitting => return format!("{}: submitting...", view.kind),
        SubmissionPhase::Submitted => return format!("{}: submitted, thank you!", view.kind),
        SubmissionPhase::Editing => {}
    }
    match view.upload_status {
        UploadStatus::Idle if view.kind.requires_upload() => {
            format!("{}: waiting for a document", view.kind)
        }
        UploadStatus::Idle => {
            format!("{}: editing, {} fields filled", view.kind, view.fields.len())
        }
        UploadStatus::Uploading => format!(
            "{}: uploading {} [{}] {:>3}%",
            view.kind,
            view.file_name,
            progress_bar(view.progress),
            view.progress
        ),
        UploadStatus::Success => format!("{}: {} uploaded successfully", view.kind, view.file_name),
        UploadStatus::Error => format!("{}: upload of {} failed", view.kind, view.file_name),
    }
}

fn progress_bar(progress: u8) -> String {
    let filled = usize::from(progress.min(100)) * BAR_WIDTH / 100;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::{update, FileCandidate, FormKind, FormState, Msg, MIME_PDF};

    #[test]
    fn uploading_line_shows_bar_and_percent() {
        let (state, _) = update(
            FormState::new(FormKind::Resume),
            Msg::FileSelected(FileCandidate::new("cv.pdf", MIME_PDF, 10)),
        );
        let (state, _) = update(
            state,
            Msg::UploadProgress {
                upload_id: 1,
                percent: 45,
            },
        );
        assert_eq!(
            render(&state.view()),
            "resume: uploading cv.pdf [#########...........]  45%"
        );
    }

    #[test]
    fn idle_forms() {
        assert_eq!(
            render(&FormState::new(FormKind::Resume).view()),
            "resume: waiting for a document"
        );
        let (contact, _) = update(
            FormState::new(FormKind::Contact),
            Msg::FieldChanged {
                name: "name".into(),
                value: "Ada".into(),
            },
        );
        assert_eq!(render(&contact.view()), "contact: editing, 1 fields filled");
    }

    #[test]
    fn bar_bounds() {
        assert_eq!(progress_bar(0), ".".repeat(BAR_WIDTH));
        assert_eq!(progress_bar(100), "#".repeat(BAR_WIDTH));
    }
}

use std::fs;
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{bail, Context};
use intake_core::{
    mime_for_extension, update, AfterSubmit, FileCandidate, FormKind, FormState, Msg,
    SubmissionPhase, UploadStatus,
};
use intake_engine::EngineHandle;
use intake_logging::{intake_debug, intake_info, intake_warn, LevelFilter, LogDestination};

use crate::cli::{Cli, Command, FormArgs};
use crate::config::{self, AppConfig};
use crate::effects::EffectRunner;
use crate::notifier::TerminalNotifier;
use crate::render::render;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Longest silence from the engine before the run is abandoned.
const IDLE_LIMIT: Duration = Duration::from_secs(60);

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let (config, load_error) = match config::load(&cli.config) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        config.log_level()
    };
    let destination = match &cli.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    if !intake_logging::initialize(&destination, level) {
        eprintln!("logging could not be initialized; continuing without it");
    }
    if let Some(err) = load_error {
        intake_warn!("{}; using defaults", err);
    }

    match &cli.command {
        Command::InitConfig { force } => init_config(&cli.config, *force),
        command => match command.form() {
            Some((kind, args)) => run_form(kind, args, &config),
            None => Ok(()),
        },
    }
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite it", path.display());
    }
    config::save(path, &AppConfig::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

/// Drives one form from first keystroke to the thank-you panel.
pub fn run_form(kind: FormKind, args: &FormArgs, config: &AppConfig) -> anyhow::Result<()> {
    let engine = EngineHandle::new(&config.engine_settings())?;
    let (msg_tx, msg_rx) = mpsc::channel();
    let runner = EffectRunner::new(engine, Arc::new(TerminalNotifier::new()), msg_tx);
    let mut session = Session {
        state: FormState::with_policy(kind, config.policy()),
        runner,
        msg_rx,
    };
    intake_info!("{} form opened", kind);
    println!("{}", render(&session.state.view()));

    let result = session.fill_and_submit(args);
    session.dispatch(Msg::Unmounted);
    session.runner.shutdown();

    if result? {
        Ok(())
    } else {
        bail!("{kind} form was not submitted")
    }
}

struct Session {
    state: FormState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
}

impl Session {
    fn dispatch(&mut self, msg: Msg) {
        intake_debug!("dispatch {:?}", msg);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            println!("{}", render(&state.view()));
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Feeds engine messages into the loop until `done` holds.
    fn wait_until<F>(&mut self, done: F) -> anyhow::Result<()>
    where
        F: Fn(&FormState) -> bool,
    {
        while !done(&self.state) {
            let msg = self
                .msg_rx
                .recv_timeout(IDLE_LIMIT)
                .context("no response from the upload engine")?;
            self.dispatch(msg);
        }
        Ok(())
    }

    /// Returns whether the submission was accepted.
    fn fill_and_submit(&mut self, args: &FormArgs) -> anyhow::Result<bool> {
        for (name, value) in &args.fields {
            if !self.state.kind().accepts_field(name) {
                intake_warn!("{} form has no field {:?}; ignored", self.state.kind(), name);
            }
            self.dispatch(Msg::FieldChanged {
                name: name.clone(),
                value: value.clone(),
            });
        }

        if let Some(path) = &args.file {
            let candidate = file_candidate(path, args.mime.as_deref())?;
            self.upload(candidate, args.retries)?;
        }

        self.dispatch(Msg::SubmitClicked);
        self.wait_until(|state| state.phase() != SubmissionPhase::Submitting)?;
        if self.state.phase() != SubmissionPhase::Submitted {
            return Ok(false);
        }

        if !args.no_wait {
            match self.state.kind().after_submit() {
                AfterSubmit::ResetAfterDelay => {
                    self.wait_until(|state| state.phase() == SubmissionPhase::Editing)?
                }
                AfterSubmit::AwaitDismiss => self.dispatch(Msg::DismissClicked),
            }
        }
        Ok(true)
    }

    fn upload(&mut self, candidate: FileCandidate, retries: u32) -> anyhow::Result<()> {
        let mut attempts_left = retries;
        self.dispatch(Msg::FileSelected(candidate.clone()));
        loop {
            self.wait_until(|state| state.upload().status() != UploadStatus::Uploading)?;
            if self.state.upload().status() != UploadStatus::Error || attempts_left == 0 {
                return Ok(());
            }
            attempts_left -= 1;
            intake_info!("retrying upload of {}", candidate.name);
            self.dispatch(Msg::RetryClicked);
            self.dispatch(Msg::FileSelected(candidate.clone()));
        }
    }
}

fn file_candidate(path: &Path, mime: Option<&str>) -> anyhow::Result<FileCandidate> {
    let metadata =
        fs::metadata(path).with_context(|| format!("cannot read {}", path.display()))?;
    if !metadata.is_file() {
        bail!("{} is not a file", path.display());
    }
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime = mime
        .or_else(|| mime_for_extension(path))
        .unwrap_or(FALLBACK_MIME);
    Ok(FileCandidate::new(name, mime, metadata.len()).with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::MIME_PDF;
    use tempfile::TempDir;

    fn fast_config() -> AppConfig {
        AppConfig {
            tick_interval_ms: 1,
            submit_delay_ms: 5,
            reset_delay_ms: 10,
            ..AppConfig::default()
        }
    }

    fn form_args(fields: &[(&str, &str)]) -> FormArgs {
        FormArgs {
            file: None,
            mime: None,
            fields: fields
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            retries: 0,
            no_wait: false,
        }
    }

    const RESUME_FIELDS: &[(&str, &str)] = &[
        ("fullName", "Ada Lovelace"),
        ("email", "ada@example.com"),
        ("phone", "+44 20 7946 0000"),
        ("location", "London"),
        ("jobTitle", "Analyst"),
        ("experience", "5-10"),
        ("skills", "Rust, mathematics"),
    ];

    #[test]
    fn candidate_guesses_mime_from_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cv.pdf");
        fs::write(&path, vec![0u8; 1234]).unwrap();

        let candidate = file_candidate(&path, None).unwrap();
        assert_eq!(candidate.name, "cv.pdf");
        assert_eq!(candidate.mime_type, MIME_PDF);
        assert_eq!(candidate.size, 1234);
        assert_eq!(candidate.path, path);
    }

    #[test]
    fn explicit_mime_wins_and_unknown_extension_falls_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cv.bin");
        fs::write(&path, b"data").unwrap();

        assert_eq!(file_candidate(&path, None).unwrap().mime_type, FALLBACK_MIME);
        assert_eq!(
            file_candidate(&path, Some(MIME_PDF)).unwrap().mime_type,
            MIME_PDF
        );
        assert!(file_candidate(&temp.path().join("absent.pdf"), None).is_err());
        assert!(file_candidate(temp.path(), None).is_err());
    }

    #[test]
    fn job_post_runs_through_reset() {
        let args = form_args(&[
            ("companyName", "Acme"),
            ("contactName", "Grace Hopper"),
            ("email", "grace@acme.test"),
            ("jobTitle", "Rust engineer"),
            ("jobType", "full-time"),
            ("location", "Remote"),
            ("experience", "3-5"),
            ("description", "Build the intake pipeline."),
            ("skills", "Rust, tokio"),
        ]);
        run_form(FormKind::JobPost, &args, &fast_config()).unwrap();
    }

    #[test]
    fn resume_with_document_is_submitted() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cv.pdf");
        fs::write(&path, b"%PDF-1.7").unwrap();
        let mut args = form_args(RESUME_FIELDS);
        args.file = Some(path);

        run_form(FormKind::Resume, &args, &fast_config()).unwrap();
    }

    #[test]
    fn resume_without_document_is_not_submitted() {
        let args = form_args(RESUME_FIELDS);
        assert!(run_form(FormKind::Resume, &args, &fast_config()).is_err());
    }

    #[test]
    fn persistent_upload_failure_exhausts_retries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cv.pdf");
        fs::write(&path, b"%PDF-1.7").unwrap();
        let mut args = form_args(RESUME_FIELDS);
        args.file = Some(path);
        args.retries = 1;
        let config = AppConfig {
            fail_at_percent: Some(10),
            ..fast_config()
        };

        assert!(run_form(FormKind::Resume, &args, &config).is_err());
    }

    #[test]
    fn short_contact_message_is_not_submitted() {
        let args = form_args(&[
            ("name", "Ada"),
            ("email", "ada@example.com"),
            ("message", "Hi"),
        ]);
        assert!(run_form(FormKind::Contact, &args, &fast_config()).is_err());
    }

    #[test]
    fn init_config_refuses_to_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("intake.ron");
        init_config(&path, false).unwrap();
        assert!(init_config(&path, false).is_err());
        init_config(&path, true).unwrap();
        assert_eq!(config::load(&path).unwrap(), AppConfig::default());
    }
}

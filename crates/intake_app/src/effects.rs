use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use intake_core::{Effect, Msg, SubmissionOutcome, UploadOutcome};
use intake_engine::{EngineEvent, EngineHandle, Notifier};
use intake_logging::{intake_debug, intake_info};

pub struct EffectRunner {
    engine: EngineHandle,
    notifier: Arc<dyn Notifier>,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        notifier: Arc<dyn Notifier>,
        msg_tx: mpsc::Sender<Msg>,
    ) -> Self {
        let runner = Self { engine, notifier };
        runner.spawn_event_loop(msg_tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartUpload { upload_id, file } => {
                    intake_info!(
                        "StartUpload upload_id={} name={} mime={}",
                        upload_id,
                        file.name,
                        file.mime_type
                    );
                    self.engine.start_upload(upload_id, file);
                }
                Effect::CancelUpload { upload_id } => self.engine.cancel_upload(upload_id),
                Effect::Submit {
                    submission_id,
                    submission,
                } => {
                    intake_info!(
                        "Submit submission_id={} kind={} fields={}",
                        submission_id,
                        submission.kind,
                        submission.fields.len()
                    );
                    self.engine.submit(submission_id, submission);
                }
                Effect::ScheduleReset { submission_id } => {
                    self.engine.schedule_reset(submission_id)
                }
                Effect::Notify(notification) => self.notifier.notify(&notification),
            }
        }
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            match engine.recv_timeout(Duration::from_millis(50)) {
                Ok(event) => {
                    if msg_tx.send(map_event(event)).is_err() {
                        intake_debug!("message loop closed; engine event pump stopping");
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    intake_debug!("engine stopped; event pump stopping");
                    break;
                }
            }
        });
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UploadProgress { upload_id, percent } => {
            Msg::UploadProgress { upload_id, percent }
        }
        EngineEvent::UploadCompleted { upload_id, result } => Msg::UploadFinished {
            upload_id,
            outcome: match result {
                Ok(_) => UploadOutcome::Completed,
                Err(err) => UploadOutcome::Failed {
                    reason: err.to_string(),
                },
            },
        },
        EngineEvent::SubmissionCompleted {
            submission_id,
            result,
        } => Msg::SubmissionFinished {
            submission_id,
            outcome: match result {
                Ok(_) => SubmissionOutcome::Accepted,
                Err(err) => SubmissionOutcome::Rejected {
                    reason: err.to_string(),
                },
            },
        },
        EngineEvent::ResetElapsed { submission_id } => Msg::ResetElapsed { submission_id },
    }
}

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use futures_util::FutureExt;
use intake_core::{FileCandidate, Submission, SubmissionId, UploadId};
use intake_logging::{intake_debug, intake_error, intake_info, intake_warn};
use tokio_util::sync::CancellationToken;

use crate::transport::ChannelProgressSink;
use crate::{
    EngineEvent, EngineSettings, FailureKind, HttpSubmitter, HttpTransport, SimulatedSubmitter,
    SimulatedTransport, Submitter, TransferError, UploadTransport,
};

enum EngineCommand {
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
    ScheduleReset {
        submission_id: SubmissionId,
    },
    Shutdown,
}

type LiveUploads = Arc<Mutex<HashMap<UploadId, CancellationToken>>>;

/// Runs transports and submitters on a background tokio runtime.
///
/// Every running upload owns a cancellation token registered here; the token
/// is dropped from the registry as soon as the upload reaches a terminal
/// result, is cancelled, or the engine shuts down.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
    uploads: LiveUploads,
}

impl EngineHandle {
    /// Simulated transport and endpoint unless the settings name real endpoints.
    pub fn new(settings: &EngineSettings) -> Result<Self, TransferError> {
        let transport: Arc<dyn UploadTransport> = match settings.upload_endpoint.as_deref() {
            Some(endpoint) => Arc::new(HttpTransport::new(endpoint, settings)?),
            None => {
                let simulated =
                    SimulatedTransport::new(settings.tick_interval, settings.progress_step);
                match settings.fail_at {
                    Some(percent) => Arc::new(simulated.failing_at(percent)),
                    None => Arc::new(simulated),
                }
            }
        };
        let submitter: Arc<dyn Submitter> = match settings.submit_endpoint.as_deref() {
            Some(endpoint) => Arc::new(HttpSubmitter::new(endpoint, settings)?),
            None => Arc::new(SimulatedSubmitter::new(settings.submit_delay)),
        };
        Ok(Self::with_parts(transport, submitter, settings.reset_delay))
    }

    pub fn with_parts(
        transport: Arc<dyn UploadTransport>,
        submitter: Arc<dyn Submitter>,
        reset_delay: Duration,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let uploads: LiveUploads = Arc::new(Mutex::new(HashMap::new()));

        let worker = Worker {
            transport,
            submitter,
            reset_delay,
            uploads: uploads.clone(),
            event_tx,
        };
        thread::spawn(move || worker.run(cmd_rx));

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
            uploads,
        }
    }

    pub fn start_upload(&self, upload_id: UploadId, file: FileCandidate) {
        self.send(EngineCommand::StartUpload { upload_id, file });
    }

    pub fn cancel_upload(&self, upload_id: UploadId) {
        self.send(EngineCommand::CancelUpload { upload_id });
    }

    pub fn submit(&self, submission_id: SubmissionId, submission: Submission) {
        self.send(EngineCommand::Submit {
            submission_id,
            submission,
        });
    }

    pub fn schedule_reset(&self, submission_id: SubmissionId) {
        self.send(EngineCommand::ScheduleReset { submission_id });
    }

    /// Cancels every running upload and stops the runtime.
    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        lock(&self.event_rx).try_recv().ok()
    }

    /// `Disconnected` once the engine has shut down and every task is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, mpsc::RecvTimeoutError> {
        lock(&self.event_rx).recv_timeout(timeout)
    }

    /// Number of uploads still holding a cancellation token.
    pub fn active_uploads(&self) -> usize {
        lock(&self.uploads).len()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            intake_debug!("engine already stopped; command dropped");
        }
    }
}

struct Worker {
    transport: Arc<dyn UploadTransport>,
    submitter: Arc<dyn Submitter>,
    reset_delay: Duration,
    uploads: LiveUploads,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Worker {
    fn run(self, cmd_rx: mpsc::Receiver<EngineCommand>) {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                intake_error!("failed to start engine runtime: {}", err);
                return;
            }
        };
        let root = CancellationToken::new();

        while let Ok(command) = cmd_rx.recv() {
            match command {
                EngineCommand::StartUpload { upload_id, file } => {
                    let token = root.child_token();
                    lock(&self.uploads).insert(upload_id, token.clone());
                    intake_info!(
                        "StartUpload upload_id={} name={} bytes={}",
                        upload_id,
                        file.name,
                        file.size
                    );
                    runtime.spawn(run_upload(
                        self.transport.clone(),
                        upload_id,
                        file,
                        token,
                        self.uploads.clone(),
                        self.event_tx.clone(),
                    ));
                }
                EngineCommand::CancelUpload { upload_id } => {
                    if let Some(token) = lock(&self.uploads).remove(&upload_id) {
                        intake_info!("CancelUpload upload_id={}", upload_id);
                        token.cancel();
                    }
                }
                EngineCommand::Submit {
                    submission_id,
                    submission,
                } => {
                    let submitter = self.submitter.clone();
                    let event_tx = self.event_tx.clone();
                    runtime.spawn(async move {
                        let result = submitter.submit(&submission).await;
                        if let Err(err) = &result {
                            intake_warn!("submission {} failed: {}", submission_id, err);
                        }
                        let _ = event_tx.send(EngineEvent::SubmissionCompleted {
                            submission_id,
                            result,
                        });
                    });
                }
                EngineCommand::ScheduleReset { submission_id } => {
                    let delay = self.reset_delay;
                    let stop = root.clone();
                    let event_tx = self.event_tx.clone();
                    runtime.spawn(async move {
                        tokio::select! {
                            _ = stop.cancelled() => {}
                            _ = tokio::time::sleep(delay) => {
                                let _ = event_tx.send(EngineEvent::ResetElapsed { submission_id });
                            }
                        }
                    });
                }
                EngineCommand::Shutdown => break,
            }
        }

        root.cancel();
        lock(&self.uploads).clear();
        runtime.shutdown_timeout(Duration::from_secs(1));
        intake_debug!("engine stopped");
    }
}

async fn run_upload(
    transport: Arc<dyn UploadTransport>,
    upload_id: UploadId,
    file: FileCandidate,
    token: CancellationToken,
    uploads: LiveUploads,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let release = TokenRelease { uploads, upload_id };
    let sink = ChannelProgressSink::new(event_tx.clone());
    let result = AssertUnwindSafe(transport.upload(upload_id, &file, &sink, &token))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            Err(TransferError::new(
                FailureKind::Panicked,
                format!("transport panicked while uploading {}", file.name),
            ))
        });
    drop(release);

    match &result {
        Ok(receipt) => intake_info!(
            "upload {} finished bytes_sent={}",
            upload_id,
            receipt.bytes_sent
        ),
        Err(err) if err.kind == FailureKind::Cancelled => {
            intake_debug!("upload {} cancelled", upload_id)
        }
        Err(err) => intake_warn!("upload {} failed: {}", upload_id, err),
    }
    let _ = event_tx.send(EngineEvent::UploadCompleted { upload_id, result });
}

/// Removes an upload's token from the registry however its task ends.
struct TokenRelease {
    uploads: LiveUploads,
    upload_id: UploadId,
}

impl Drop for TokenRelease {
    fn drop(&mut self) {
        lock(&self.uploads).remove(&self.upload_id);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

use std::time::Duration;

use intake_core::{FileCandidate, UploadId};
use intake_logging::intake_debug;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, FailureKind, TransferError, UploadReceipt};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Moves one accepted file to its destination.
///
/// Implementations emit `EngineEvent::UploadProgress` with non-decreasing
/// percentages, stop promptly once `cancel` fires, and only report 100 when
/// the transfer has really succeeded.
#[async_trait::async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload(
        &self,
        upload_id: UploadId,
        file: &FileCandidate,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<UploadReceipt, TransferError>;
}

const MIN_TICK: Duration = Duration::from_millis(1);

/// Stand-in transfer: a fixed step every tick until 100 %.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    tick: Duration,
    step: u8,
    fail_at: Option<u8>,
}

impl SimulatedTransport {
    /// `tick` is raised to at least 1 ms; tokio intervals cannot have a zero period.
    pub fn new(tick: Duration, step: u8) -> Self {
        Self {
            tick: tick.max(MIN_TICK),
            step: step.clamp(1, 100),
            fail_at: None,
        }
    }

    /// Fail with `FailureKind::Simulated` once progress would reach `percent`.
    pub fn failing_at(mut self, percent: u8) -> Self {
        self.fail_at = Some(percent);
        self
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), 5)
    }
}

#[async_trait::async_trait]
impl UploadTransport for SimulatedTransport {
    async fn upload(
        &self,
        upload_id: UploadId,
        file: &FileCandidate,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<UploadReceipt, TransferError> {
        let mut ticker = interval_at(Instant::now() + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut progress: u8 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransferError::cancelled()),
                _ = ticker.tick() => {}
            }

            progress = progress.saturating_add(self.step).min(100);
            if self.fail_at.is_some_and(|fail_at| progress >= fail_at) {
                return Err(TransferError::new(
                    FailureKind::Simulated,
                    format!("simulated failure at {progress}%"),
                ));
            }
            intake_debug!("upload {} {} at {}%", upload_id, file.name, progress);
            sink.emit(EngineEvent::UploadProgress {
                upload_id,
                percent: progress,
            });
            if progress == 100 {
                return Ok(UploadReceipt {
                    bytes_sent: file.size,
                    sha256: None,
                });
            }
        }
    }
}

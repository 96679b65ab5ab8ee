use std::sync::Arc;
use std::time::{Duration, Instant};

use intake_core::{FileCandidate, FormData, FormKind, Submission, UploadId, MIME_PDF};
use intake_engine::{
    EngineEvent, EngineHandle, EngineSettings, FailureKind, ProgressSink, SimulatedSubmitter,
    SimulatedTransport, TransferError, UploadReceipt, UploadTransport,
};
use tokio_util::sync::CancellationToken;

fn engine(tick: Duration) -> EngineHandle {
    EngineHandle::with_parts(
        Arc::new(SimulatedTransport::new(tick, 5)),
        Arc::new(SimulatedSubmitter::new(Duration::from_millis(5))),
        Duration::from_millis(20),
    )
}

fn wait_for<F>(engine: &EngineHandle, mut done: F) -> Vec<EngineEvent>
where
    F: FnMut(&EngineEvent) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        if let Ok(event) = engine.recv_timeout(Duration::from_millis(50)) {
            let finished = done(&event);
            events.push(event);
            if finished {
                return events;
            }
        }
    }
    panic!("timed out; got {events:?}");
}

struct PanickingTransport;

#[async_trait::async_trait]
impl UploadTransport for PanickingTransport {
    async fn upload(
        &self,
        _upload_id: UploadId,
        file: &FileCandidate,
        _sink: &dyn ProgressSink,
        _cancel: &CancellationToken,
    ) -> Result<UploadReceipt, TransferError> {
        panic!("transport broke on {}", file.name);
    }
}

fn pdf() -> FileCandidate {
    FileCandidate::new("cv.pdf", MIME_PDF, 2_000_000)
}

#[test]
fn upload_runs_to_completion_and_releases_token() {
    let engine = engine(Duration::from_millis(1));
    engine.start_upload(1, pdf());

    let events = wait_for(&engine, |event| {
        matches!(event, EngineEvent::UploadCompleted { .. })
    });

    let percents: Vec<u8> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::UploadProgress { upload_id: 1, percent } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents, (1..=20).map(|step| step * 5).collect::<Vec<u8>>());
    assert!(matches!(
        events.last(),
        Some(EngineEvent::UploadCompleted { upload_id: 1, result: Ok(_) })
    ));
    assert_eq!(engine.active_uploads(), 0);
    engine.shutdown();
}

#[test]
fn cancel_stops_upload_and_releases_token() {
    let engine = engine(Duration::from_millis(200));
    engine.start_upload(4, pdf());
    engine.cancel_upload(4);

    let events = wait_for(&engine, |event| {
        matches!(event, EngineEvent::UploadCompleted { .. })
    });
    match events.last() {
        Some(EngineEvent::UploadCompleted {
            upload_id: 4,
            result: Err(err),
        }) => assert_eq!(err.kind, FailureKind::Cancelled),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(engine.active_uploads(), 0);
    engine.shutdown();
}

#[test]
fn cancelling_unknown_upload_is_harmless() {
    let engine = engine(Duration::from_millis(1));
    engine.cancel_upload(99);
    engine.start_upload(1, pdf());
    wait_for(&engine, |event| {
        matches!(event, EngineEvent::UploadCompleted { result: Ok(_), .. })
    });
    assert!(engine.try_recv().is_none());
    engine.shutdown();
}

#[test]
fn submission_and_reset_are_delivered() {
    let engine = engine(Duration::from_millis(1));
    engine.submit(
        9,
        Submission {
            kind: FormKind::JobPost,
            fields: FormData::new(),
            file: None,
        },
    );
    let events = wait_for(&engine, |event| {
        matches!(event, EngineEvent::SubmissionCompleted { .. })
    });
    assert!(matches!(
        events.last(),
        Some(EngineEvent::SubmissionCompleted {
            submission_id: 9,
            result: Ok(_),
        })
    ));

    engine.schedule_reset(9);
    wait_for(&engine, |event| {
        matches!(event, EngineEvent::ResetElapsed { submission_id: 9 })
    });
    engine.shutdown();
}

#[test]
fn shutdown_clears_running_uploads() {
    let engine = engine(Duration::from_secs(1));
    engine.start_upload(1, pdf());
    engine.start_upload(2, pdf());
    engine.shutdown();

    let deadline = Instant::now() + Duration::from_secs(5);
    while engine.active_uploads() > 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(engine.active_uploads(), 0);
}

#[test]
fn panicking_transport_reports_failure_and_releases_token() {
    let engine = EngineHandle::with_parts(
        Arc::new(PanickingTransport),
        Arc::new(SimulatedSubmitter::new(Duration::from_millis(5))),
        Duration::from_millis(20),
    );
    engine.start_upload(3, pdf());

    let events = wait_for(&engine, |event| {
        matches!(event, EngineEvent::UploadCompleted { .. })
    });
    match events.last() {
        Some(EngineEvent::UploadCompleted {
            upload_id: 3,
            result: Err(err),
        }) => assert_eq!(err.kind, FailureKind::Panicked),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(engine.active_uploads(), 0);
    engine.shutdown();
}

#[test]
fn zero_tick_from_settings_still_completes() {
    let settings = EngineSettings {
        tick_interval: Duration::ZERO,
        ..EngineSettings::default()
    };
    let engine = EngineHandle::new(&settings).expect("engine");
    engine.start_upload(1, pdf());
    let events = wait_for(&engine, |event| {
        matches!(event, EngineEvent::UploadCompleted { .. })
    });
    assert!(matches!(
        events.last(),
        Some(EngineEvent::UploadCompleted { upload_id: 1, result: Ok(_) })
    ));
    assert_eq!(engine.active_uploads(), 0);
    engine.shutdown();
}

#[test]
fn settings_with_failure_injection_reach_error() {
    let settings = EngineSettings {
        tick_interval: Duration::from_millis(1),
        fail_at: Some(20),
        ..EngineSettings::default()
    };
    let engine = EngineHandle::new(&settings).expect("engine");
    engine.start_upload(1, pdf());
    let events = wait_for(&engine, |event| {
        matches!(event, EngineEvent::UploadCompleted { .. })
    });
    match events.last() {
        Some(EngineEvent::UploadCompleted {
            result: Err(err), ..
        }) => assert_eq!(err.kind, FailureKind::Simulated),
        other => panic!("unexpected {other:?}"),
    }
    engine.shutdown();
}

#[test]
fn invalid_endpoint_in_settings_is_an_error() {
    let settings = EngineSettings {
        upload_endpoint: Some("not a url".into()),
        ..EngineSettings::default()
    };
    let err = EngineHandle::new(&settings).err().expect("invalid endpoint");
    assert_eq!(err.kind, FailureKind::InvalidEndpoint);
}

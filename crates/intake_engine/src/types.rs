use std::fmt;

use intake_core::{SubmissionId, UploadId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    UploadProgress {
        upload_id: UploadId,
        percent: u8,
    },
    UploadCompleted {
        upload_id: UploadId,
        result: Result<UploadReceipt, TransferError>,
    },
    SubmissionCompleted {
        submission_id: SubmissionId,
        result: Result<SubmissionReceipt, TransferError>,
    },
    ResetElapsed {
        submission_id: SubmissionId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub bytes_sent: u64,
    /// Hex SHA-256 of the bytes actually streamed; `None` for simulated uploads.
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// HTTP status of the endpoint; `None` for the simulated endpoint.
    pub status: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransferError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransferError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "upload cancelled")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidEndpoint,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: u64 },
    Io,
    Encoding,
    Cancelled,
    /// Injected by the simulated transport.
    Simulated,
    Network,
    /// The transport task panicked.
    Panicked,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidEndpoint => write!(f, "invalid endpoint"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "file too large (max {max_bytes}, actual {actual})")
            }
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Encoding => write!(f, "encoding error"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Simulated => write!(f, "simulated failure"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Panicked => write!(f, "transport panicked"),
        }
    }
}

//! Intake engine: upload transports, submission endpoints and effect execution.
mod engine;
mod http;
mod notify;
mod settings;
mod submit;
mod transport;
mod types;

pub use engine::EngineHandle;
pub use http::HttpTransport;
pub use notify::{LogNotifier, Notifier};
pub use settings::{parse_endpoint, EngineSettings};
pub use submit::{HttpSubmitter, SimulatedSubmitter, Submitter};
pub use transport::{ChannelProgressSink, ProgressSink, SimulatedTransport, UploadTransport};
pub use types::{EngineEvent, FailureKind, SubmissionReceipt, TransferError, UploadReceipt};

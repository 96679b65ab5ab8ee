use std::io;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use intake_core::{FileCandidate, UploadId};
use intake_logging::intake_info;
use reqwest::header::CONTENT_TYPE;
use sha2::{Digest, Sha256};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::settings::parse_endpoint;
use crate::{
    EngineEvent, EngineSettings, FailureKind, ProgressSink, TransferError, UploadReceipt,
    UploadTransport,
};

pub(crate) const FILE_NAME_HEADER: &str = "x-file-name";

/// Streams the file body to an HTTP endpoint with a single POST.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpTransport {
    pub fn new(endpoint: &str, settings: &EngineSettings) -> Result<Self, TransferError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            client: build_client(settings)?,
            max_bytes: settings.max_bytes,
        })
    }
}

pub(crate) fn build_client(settings: &EngineSettings) -> Result<reqwest::Client, TransferError> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .build()
        .map_err(|err| TransferError::new(FailureKind::Network, err.to_string()))
}

#[async_trait::async_trait]
impl UploadTransport for HttpTransport {
    async fn upload(
        &self,
        upload_id: UploadId,
        file: &FileCandidate,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<UploadReceipt, TransferError> {
        let handle = tokio::fs::File::open(&file.path).await.map_err(io_error)?;
        let total = handle.metadata().await.map_err(io_error)?.len();
        // The file may have grown on disk since it was validated.
        if total > self.max_bytes {
            return Err(too_large(self.max_bytes, total));
        }

        let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel::<Bytes>();
        let body = limited_body(handle, self.max_bytes, chunk_tx);

        let request = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, file.mime_type.as_str())
            .header(FILE_NAME_HEADER, file.name.as_str())
            .body(reqwest::Body::wrap_stream(body))
            .send();
        tokio::pin!(request);

        let mut hasher = Sha256::new();
        let mut sent: u64 = 0;
        let mut reported: u8 = 0;

        let response = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransferError::cancelled()),
                Some(chunk) = chunk_rx.recv() => {
                    hasher.update(&chunk);
                    sent += chunk.len() as u64;
                    if sent > self.max_bytes {
                        return Err(too_large(self.max_bytes, sent));
                    }
                    // 100 is reserved for the server's acknowledgement.
                    let percent = percent_of(sent, total).min(99);
                    if percent > reported {
                        reported = percent;
                        sink.emit(EngineEvent::UploadProgress { upload_id, percent });
                    }
                }
                result = &mut request => break result.map_err(map_reqwest_error)?,
            }
        };

        while let Ok(chunk) = chunk_rx.try_recv() {
            hasher.update(&chunk);
            sent += chunk.len() as u64;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        sink.emit(EngineEvent::UploadProgress {
            upload_id,
            percent: 100,
        });
        let sha256 = format!("{:x}", hasher.finalize());
        intake_info!(
            "upload {} accepted by {} bytes={} sha256={}",
            upload_id,
            self.endpoint,
            sent,
            sha256
        );
        Ok(UploadReceipt {
            bytes_sent: sent,
            sha256: Some(sha256),
        })
    }
}

/// Body stream that mirrors every chunk to `chunk_tx` and fails once more
/// than `max_bytes` have been read, so a file growing mid-upload is cut off.
fn limited_body<R>(
    reader: R,
    max_bytes: u64,
    chunk_tx: mpsc::UnboundedSender<Bytes>,
) -> impl Stream<Item = io::Result<Bytes>> + Send + Sync + 'static
where
    R: AsyncRead + Send + Sync + 'static,
{
    let mut streamed: u64 = 0;
    ReaderStream::new(reader).map(move |item| {
        let chunk = item?;
        streamed += chunk.len() as u64;
        let _ = chunk_tx.send(chunk.clone());
        if streamed > max_bytes {
            return Err(io::Error::other(format!(
                "file grew past the {max_bytes} byte limit"
            )));
        }
        Ok(chunk)
    })
}

fn too_large(max_bytes: u64, actual: u64) -> TransferError {
    TransferError::new(
        FailureKind::TooLarge { max_bytes, actual },
        "file too large",
    )
}

fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (sent.saturating_mul(100) / total).min(100) as u8
}

fn io_error(err: io::Error) -> TransferError {
    TransferError::new(FailureKind::Io, err.to_string())
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransferError {
    if err.is_timeout() {
        return TransferError::new(FailureKind::Timeout, err.to_string());
    }
    TransferError::new(FailureKind::Network, err.to_string())
}

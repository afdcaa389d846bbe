//! HTTP client for the HOT22 ingestion backend.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use tokio::{fs, io::AsyncRead, sync::mpsc};
use tokio_util::io::ReaderStream;

use crate::config::Config;
use crate::query::Query;
use crate::upload::FileMeta;

use super::types::{DeleteResponse, HealthResponse, ListResponse, StatsResponse, UploadResponse};

/// Chunk size for reading the upload body off disk.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Signals emitted while a file is being transferred. Transfer progress and
/// the hand-off to the server are distinct: progress reaching 100 only means
/// the body has been read, not that processing finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferSignal {
    /// Transfer progress in percent, monotone per upload.
    Progress(u8),
    /// The request body is on its way to the server.
    Sent,
}

/// The backend operations the worker depends on. A trait so tests can drive
/// the worker against an in-memory backend.
#[async_trait]
pub trait Hot22Backend {
    /// Fetch one page of records for the given query.
    async fn list_records(&self, query: &Query) -> Result<ListResponse>;

    /// Upload a HOT22 flat file, reporting transfer signals along the way.
    async fn upload_file(
        &self,
        path: &Path,
        file: &FileMeta,
        signals: mpsc::Sender<TransferSignal>,
    ) -> Result<UploadResponse>;

    /// Fetch backend record statistics.
    async fn get_stats(&self) -> Result<StatsResponse>;

    /// Delete every stored record.
    async fn delete_all_records(&self) -> Result<DeleteResponse>;

    /// Check backend health.
    async fn check_health(&self) -> Result<HealthResponse>;
}

/// reqwest-backed client for the real backend.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from the configured base URL and timeout.
    pub fn new(cfg: &Config) -> Result<Self> {
        // Upload duration scales with file size, so bound the connect phase
        // and per-read stalls rather than whole requests.
        let timeout = Duration::from_secs(cfg.backend.timeout_secs);
        let http = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: cfg.backend.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a `Query` onto the backend's query-string parameters.
    fn list_params(query: &Query) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), query.page.to_string()),
            ("limit".to_string(), query.page_size.to_string()),
            ("sortBy".to_string(), query.sort_key.clone()),
            ("sortOrder".to_string(), query.sort_direction.as_str().to_string()),
        ];
        for (key, value) in &query.filters {
            params.push((key.clone(), value.clone()));
        }
        params
    }
}

/// Chunk a reader and report transfer progress per chunk as a percentage of
/// `total`, followed by a `Sent` signal once all expected bytes are out.
/// Signals are sent non-blockingly: a dropped progress value only coarsens
/// the gauge, and the caller repeats `Sent` after the request completes.
fn progress_stream<R>(
    reader: R,
    total: u64,
    signals: mpsc::Sender<TransferSignal>,
) -> impl Stream<Item = std::io::Result<tokio_util::bytes::Bytes>> + Send + 'static
where
    R: AsyncRead + Send + 'static,
{
    let mut sent: u64 = 0;
    let mut last_pct: u8 = 0;
    let mut handed_off = false;
    ReaderStream::with_capacity(reader, UPLOAD_CHUNK_BYTES).map(move |chunk| {
        if let Ok(bytes) = &chunk {
            sent += bytes.len() as u64;
            let pct = if total == 0 {
                100
            } else {
                (sent * 100 / total).min(100) as u8
            };
            // Only report forward movement.
            if pct > last_pct {
                last_pct = pct;
                let _ = signals.try_send(TransferSignal::Progress(pct));
            }
            if sent >= total && !handed_off {
                handed_off = true;
                let _ = signals.try_send(TransferSignal::Sent);
            }
        }
        chunk
    })
}

#[async_trait]
impl Hot22Backend for ApiClient {
    async fn list_records(&self, query: &Query) -> Result<ListResponse> {
        let resp = self
            .http
            .get(self.url("/api/records"))
            .query(&Self::list_params(query))
            .send()
            .await?
            .error_for_status()?
            .json::<ListResponse>()
            .await?;
        Ok(resp)
    }

    async fn upload_file(
        &self,
        path: &Path,
        file: &FileMeta,
        signals: mpsc::Sender<TransferSignal>,
    ) -> Result<UploadResponse> {
        let reader = fs::File::open(path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;

        // An empty file produces no chunks, so report it up front.
        if file.size == 0 {
            let _ = signals.send(TransferSignal::Progress(100)).await;
        }

        // Stream the body so progress tracks bytes actually pulled onto the
        // wire instead of bytes read off disk.
        let stream = progress_stream(reader, file.size, signals.clone());
        let part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(stream),
            file.size,
        )
        .file_name(file.name.clone())
        .mime_str(&file.mime_hint)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await?;
        // The body is fully on the wire once a response exists; repeat the
        // hand-off signal in case the in-stream one was dropped on a full
        // channel. The state machine treats the duplicate as a no-op.
        let _ = signals.send(TransferSignal::Sent).await;

        let resp = resp.error_for_status()?.json::<UploadResponse>().await?;
        Ok(resp)
    }

    async fn get_stats(&self) -> Result<StatsResponse> {
        let resp = self
            .http
            .get(self.url("/api/stats"))
            .send()
            .await?
            .error_for_status()?
            .json::<StatsResponse>()
            .await?;
        Ok(resp)
    }

    async fn delete_all_records(&self) -> Result<DeleteResponse> {
        let resp = self
            .http
            .delete(self.url("/api/records"))
            .send()
            .await?
            .error_for_status()?
            .json::<DeleteResponse>()
            .await?;
        Ok(resp)
    }

    async fn check_health(&self) -> Result<HealthResponse> {
        let resp = self
            .http
            .get(self.url("/api/health"))
            .send()
            .await?
            .error_for_status()?
            .json::<HealthResponse>()
            .await?;
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[tokio::test]
    async fn test_progress_stream_reports_monotone_progress_then_sent() {
        let body = vec![7u8; UPLOAD_CHUNK_BYTES * 3 + 100];
        let total = body.len() as u64;
        let (tx, mut rx) = mpsc::channel(32);
        let mut stream = progress_stream(Cursor::new(body), total, tx);

        // Drain the stream the way the HTTP body would.
        let mut bytes_out = 0u64;
        while let Some(chunk) = stream.next().await {
            bytes_out += chunk.unwrap().len() as u64;
        }
        assert_eq!(bytes_out, total);

        let mut progress = vec![];
        let mut sent_seen = false;
        while let Ok(sig) = rx.try_recv() {
            match sig {
                TransferSignal::Progress(p) => {
                    // Progress never trails the hand-off signal.
                    assert!(!sent_seen);
                    progress.push(p);
                }
                TransferSignal::Sent => sent_seen = true,
            }
        }
        assert!(sent_seen);
        assert_eq!(progress.last().copied(), Some(100));
        assert!(progress.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_progress_stream_short_read_withholds_sent() {
        // Fewer bytes than expected (file shrank after sizing): the hand-off
        // signal stays with the caller's post-request fallback.
        let body = vec![7u8; 1000];
        let (tx, mut rx) = mpsc::channel(32);
        let mut stream = progress_stream(Cursor::new(body), 4096, tx);
        while let Some(chunk) = stream.next().await {
            chunk.unwrap();
        }
        while let Ok(sig) = rx.try_recv() {
            assert_ne!(sig, TransferSignal::Sent);
        }
    }
}

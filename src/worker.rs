//! Background worker handling backend API jobs.

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::{
    api::{
        client::{Hot22Backend, TransferSignal},
        types::{HealthResponse, ListResponse, StatsResponse, UploadResponse},
    },
    query::Query,
    upload::FileMeta,
};

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// Fetch one page of records. The token ties the eventual response back
    /// to the query generation that requested it.
    FetchRecords { token: u64, query: Query },
    /// Transfer a validated HOT22 file to the backend.
    Upload { path: PathBuf, file: FileMeta },
    /// Refresh backend statistics.
    FetchStats,
    /// Delete every stored record.
    DeleteAll,
    /// Probe backend health.
    CheckHealth,
}

/// Events emitted by the worker for UI updates.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    /// A record page arrived. The app decides whether the token is still
    /// current before applying it.
    RecordsLoaded {
        token: u64,
        query: Query,
        response: ListResponse,
    },
    /// A record fetch failed.
    RecordsFailed { token: u64, message: String },
    /// Transfer progress for the active upload.
    UploadProgress(u8),
    /// The upload body was handed to the server; processing has begun.
    UploadSent,
    /// The server finished processing the upload.
    UploadDone(UploadResponse),
    /// The upload failed in transfer or on the server.
    UploadFailed(String),
    /// Fresh backend statistics.
    StatsLoaded(StatsResponse),
    /// Result of the delete-all call.
    AllDeleted { ok: bool },
    /// Backend health probe result.
    HealthChecked(HealthResponse),
    /// User-visible error message.
    Error(String),
}

/// Main worker loop: handle commands sequentially. Record fetches are
/// spawned so a newer query can supersede one still in flight; uploads run
/// inline, which enforces one transfer at a time.
pub async fn run<B>(mut rx: mpsc::Receiver<WorkerCmd>, tx: mpsc::Sender<WorkerEvent>, backend: B)
where
    B: Hot22Backend + Clone + Send + Sync + 'static,
{
    tracing::info!("worker started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            WorkerCmd::FetchRecords { token, query } => {
                tracing::info!("fetch records: token {token}, page {}", query.page);
                let backend = backend.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    match backend.list_records(&query).await {
                        Ok(response) => {
                            tracing::info!(
                                "fetch success: token {token}, {} records",
                                response.data.len()
                            );
                            let _ = tx
                                .send(WorkerEvent::RecordsLoaded {
                                    token,
                                    query,
                                    response,
                                })
                                .await;
                        }
                        Err(e) => {
                            tracing::error!("fetch failed: token {token}: {e}");
                            let _ = tx
                                .send(WorkerEvent::RecordsFailed {
                                    token,
                                    message: e.to_string(),
                                })
                                .await;
                        }
                    }
                });
            }

            WorkerCmd::Upload { path, file } => {
                tracing::info!("upload start: {} ({} bytes)", file.name, file.size);
                // Forward transfer signals to the UI while the client reads
                // and sends the body.
                let (sig_tx, mut sig_rx) = mpsc::channel::<TransferSignal>(32);
                let fwd_tx = tx.clone();
                let forwarder = tokio::spawn(async move {
                    while let Some(sig) = sig_rx.recv().await {
                        let ev = match sig {
                            TransferSignal::Progress(pct) => WorkerEvent::UploadProgress(pct),
                            TransferSignal::Sent => WorkerEvent::UploadSent,
                        };
                        let _ = fwd_tx.send(ev).await;
                    }
                });

                let result = backend.upload_file(&path, &file, sig_tx).await;
                // Drain the signal channel before reporting the outcome so
                // progress events never arrive after the terminal event.
                let _ = forwarder.await;

                match result {
                    Ok(resp) => {
                        tracing::info!(
                            "upload done: {} processed, {} errors",
                            resp.results.summary.total_processed,
                            resp.results.summary.total_errors
                        );
                        let _ = tx.send(WorkerEvent::UploadDone(resp)).await;
                    }
                    Err(e) => {
                        tracing::error!("upload failed: {e}");
                        let _ = tx.send(WorkerEvent::UploadFailed(e.to_string())).await;
                    }
                }
            }

            WorkerCmd::FetchStats => match backend.get_stats().await {
                Ok(stats) => {
                    tracing::info!("stats loaded: {} records", stats.total_records);
                    let _ = tx.send(WorkerEvent::StatsLoaded(stats)).await;
                }
                Err(e) => {
                    tracing::error!("stats failed: {e}");
                    let _ = tx.send(WorkerEvent::Error(format!("stats failed: {e}"))).await;
                }
            },

            WorkerCmd::DeleteAll => match backend.delete_all_records().await {
                Ok(resp) => {
                    tracing::info!("delete all: ok={}", resp.ok);
                    let _ = tx.send(WorkerEvent::AllDeleted { ok: resp.ok }).await;
                }
                Err(e) => {
                    tracing::error!("delete all failed: {e}");
                    let _ = tx
                        .send(WorkerEvent::Error(format!("delete failed: {e}")))
                        .await;
                }
            },

            WorkerCmd::CheckHealth => match backend.check_health().await {
                Ok(health) => {
                    let _ = tx.send(WorkerEvent::HealthChecked(health)).await;
                }
                Err(e) => {
                    tracing::error!("health check failed: {e}");
                    let _ = tx
                        .send(WorkerEvent::Error(format!("health check failed: {e}")))
                        .await;
                }
            },
        }
    }
}

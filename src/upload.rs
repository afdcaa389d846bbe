//! Upload pipeline: drives a single HOT22 file through validation, transfer,
//! server-side processing, and result capture.
//!
//! The pipeline owns the one and only `UploadJob`; the worker reports
//! transfer progress and round-trip results as events, and the app feeds
//! them back in here. State only ever moves forward; the single path back to
//! `Idle` from a terminal state is `reset`.

use thiserror::Error;

use crate::history::{HistoryEntry, UploadOutcome};

/// Accepted flat-file extension.
pub const ACCEPTED_EXTENSION: &str = "txt";
/// Default client-side size cap: 100 MB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// What the app knows about a file before any network call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    pub mime_hint: String,
}

impl FileMeta {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            mime_hint: "text/plain".into(),
        }
    }
}

/// Per-record-type counters from the backend summary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeCounts {
    pub processed: u64,
    pub saved: u64,
    pub errors: u64,
}

/// Immutable outcome of a completed upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessingResult {
    pub total_processed: u64,
    pub total_saved: u64,
    pub total_errors: u64,
    pub processing_time_ms: u64,
    /// Counts per record type, sorted by type code for display.
    pub record_type_counts: Vec<(String, TypeCounts)>,
}

/// Upload failure modes, split so handling code is checked for exhaustiveness.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    /// Wrong file type, rejected before any request.
    #[error("unsupported file type: {name} (expected .{ACCEPTED_EXTENSION})")]
    BadExtension { name: String },
    /// File exceeds the client-side size cap.
    #[error("file too large: {size} bytes (limit {max})")]
    TooLarge { size: u64, max: u64 },
    /// Another upload is still running; one non-terminal job at a time.
    #[error("an upload is already in progress ({status:?})")]
    Busy { status: UploadStatus },
    /// Network/timeout/non-2xx failure. Aborts the whole job; no retry.
    #[error("transfer failed: {0}")]
    Transport(String),
}

/// Pipeline states. `Completed` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Validating,
    Uploading,
    Processing,
    Completed,
    Failed,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Failed)
    }
}

/// The single upload job owned by the pipeline.
#[derive(Clone, Debug)]
pub struct UploadJob {
    pub file: FileMeta,
    pub status: UploadStatus,
    /// Transfer progress, 0..=100. Monotone while `Uploading`.
    pub progress: u8,
    pub result: Option<ProcessingResult>,
    pub error: Option<UploadError>,
}

/// Single-writer state machine for the upload lifecycle.
pub struct UploadPipeline {
    job: Option<UploadJob>,
    max_bytes: u64,
}

impl UploadPipeline {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            job: None,
            max_bytes: if max_bytes == 0 {
                DEFAULT_MAX_UPLOAD_BYTES
            } else {
                max_bytes
            },
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.job.as_ref().map_or(UploadStatus::Idle, |j| j.status)
    }

    pub fn job(&self) -> Option<&UploadJob> {
        self.job.as_ref()
    }

    /// Accept a file and validate it. A rejected file never becomes an
    /// `UploadJob`: the pipeline stays `Idle` and the error is surfaced to
    /// the caller only.
    pub fn select_file(&mut self, file: FileMeta) -> Result<(), UploadError> {
        if let Some(job) = &self.job {
            return Err(UploadError::Busy { status: job.status });
        }
        let extension_ok = file
            .name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(ACCEPTED_EXTENSION));
        if !extension_ok {
            return Err(UploadError::BadExtension { name: file.name });
        }
        if file.size > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: file.size,
                max: self.max_bytes,
            });
        }
        self.job = Some(UploadJob {
            file,
            status: UploadStatus::Validating,
            progress: 0,
            result: None,
            error: None,
        });
        Ok(())
    }

    /// Validation passed; the transfer is starting.
    pub fn begin_transfer(&mut self) {
        if let Some(job) = &mut self.job
            && job.status == UploadStatus::Validating
        {
            job.status = UploadStatus::Uploading;
        }
    }

    /// Record transfer progress. Only meaningful while `Uploading`; values
    /// never decrease and are clamped to 100. Out-of-phase reports (late
    /// events after a failure) are dropped.
    pub fn set_progress(&mut self, pct: u8) {
        if let Some(job) = &mut self.job
            && job.status == UploadStatus::Uploading
        {
            job.progress = job.progress.max(pct.min(100));
        }
    }

    /// The request body has been handed to the server; transfer progress and
    /// processing completion stay distinct signals.
    pub fn server_ack(&mut self) {
        if let Some(job) = &mut self.job
            && job.status == UploadStatus::Uploading
        {
            job.progress = 100;
            job.status = UploadStatus::Processing;
        }
    }

    /// Server returned a result: the job completes and exactly one history
    /// entry is produced. Ignored unless the job is `Processing`.
    pub fn complete(&mut self, result: ProcessingResult) -> Option<HistoryEntry> {
        let job = self.job.as_mut()?;
        if job.status != UploadStatus::Processing {
            return None;
        }
        job.status = UploadStatus::Completed;
        let entry = HistoryEntry::new(
            job.file.name.clone(),
            UploadOutcome::Success,
            result.total_processed,
            result.processing_time_ms,
        );
        job.result = Some(result);
        Some(entry)
    }

    /// Any network/server failure in a non-terminal state: the job fails,
    /// progress drops back to 0, and exactly one history entry is produced.
    pub fn fail(&mut self, error: UploadError) -> Option<HistoryEntry> {
        let job = self.job.as_mut()?;
        if job.status.is_terminal() {
            return None;
        }
        job.status = UploadStatus::Failed;
        job.progress = 0;
        job.error = Some(error);
        Some(HistoryEntry::new(
            job.file.name.clone(),
            UploadOutcome::Error,
            0,
            0,
        ))
    }

    /// Clear a terminal job. The only way back to `Idle`; a running job
    /// cannot be reset.
    pub fn reset(&mut self) {
        if self.status().is_terminal() {
            self.job = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(total_processed: u64) -> ProcessingResult {
        ProcessingResult {
            total_processed,
            total_saved: total_processed,
            total_errors: 0,
            processing_time_ms: 1234,
            record_type_counts: vec![("BKS24".into(), TypeCounts {
                processed: total_processed,
                saved: total_processed,
                errors: 0,
            })],
        }
    }

    #[test]
    fn test_happy_path_transitions_and_monotone_progress() {
        let mut pipeline = UploadPipeline::new(DEFAULT_MAX_UPLOAD_BYTES);
        // 50 MB .txt file passes validation.
        let file = FileMeta::new("HOT22_202608.txt", 50 * 1024 * 1024);
        pipeline.select_file(file).unwrap();
        assert_eq!(pipeline.status(), UploadStatus::Validating);

        pipeline.begin_transfer();
        assert_eq!(pipeline.status(), UploadStatus::Uploading);

        let mut seen = vec![];
        for pct in [5u8, 30, 30, 65, 90, 100] {
            pipeline.set_progress(pct);
            seen.push(pipeline.job().unwrap().progress);
        }
        // Progress never decreases, even if a late low value arrives.
        pipeline.set_progress(40);
        seen.push(pipeline.job().unwrap().progress);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(pipeline.job().unwrap().progress, 100);

        pipeline.server_ack();
        assert_eq!(pipeline.status(), UploadStatus::Processing);

        let entry = pipeline.complete(result_with(3120)).expect("history entry");
        assert_eq!(pipeline.status(), UploadStatus::Completed);
        assert_eq!(entry.outcome, UploadOutcome::Success);
        assert_eq!(entry.record_count, 3120);
        assert_eq!(entry.processing_time_ms, 1234);
        assert_eq!(pipeline.job().unwrap().progress, 100);
        assert!(pipeline.job().unwrap().result.is_some());

        // A second result does not produce a second entry.
        assert!(pipeline.complete(result_with(1)).is_none());

        pipeline.reset();
        assert_eq!(pipeline.status(), UploadStatus::Idle);
        assert!(pipeline.job().is_none());
    }

    #[test]
    fn test_oversize_file_is_rejected_without_job() {
        let mut pipeline = UploadPipeline::new(DEFAULT_MAX_UPLOAD_BYTES);
        let err = pipeline
            .select_file(FileMeta::new("big.txt", 150 * 1024 * 1024))
            .unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
        // No job was stored, so no history entry can ever follow.
        assert_eq!(pipeline.status(), UploadStatus::Idle);
        assert!(pipeline.job().is_none());
        assert!(pipeline.fail(UploadError::Transport("late".into())).is_none());
    }

    #[test]
    fn test_wrong_extension_is_rejected() {
        let mut pipeline = UploadPipeline::new(DEFAULT_MAX_UPLOAD_BYTES);
        for name in ["report.csv", "hot22", "archive.txt.gz"] {
            let err = pipeline.select_file(FileMeta::new(name, 1024)).unwrap_err();
            assert!(matches!(err, UploadError::BadExtension { .. }), "{name}");
            assert_eq!(pipeline.status(), UploadStatus::Idle);
        }
        // Extension matching is case-insensitive.
        assert!(pipeline.select_file(FileMeta::new("HOT22.TXT", 1024)).is_ok());
    }

    #[test]
    fn test_second_upload_is_rejected_while_active() {
        let mut pipeline = UploadPipeline::new(DEFAULT_MAX_UPLOAD_BYTES);
        pipeline.select_file(FileMeta::new("a.txt", 100)).unwrap();
        pipeline.begin_transfer();
        let err = pipeline.select_file(FileMeta::new("b.txt", 100)).unwrap_err();
        assert_eq!(err, UploadError::Busy {
            status: UploadStatus::Uploading,
        });
        // Also rejected from a terminal state until reset.
        pipeline.fail(UploadError::Transport("boom".into())).unwrap();
        assert!(matches!(
            pipeline.select_file(FileMeta::new("b.txt", 100)),
            Err(UploadError::Busy { .. })
        ));
        pipeline.reset();
        assert!(pipeline.select_file(FileMeta::new("b.txt", 100)).is_ok());
    }

    #[test]
    fn test_failure_resets_progress_and_emits_one_entry() {
        let mut pipeline = UploadPipeline::new(DEFAULT_MAX_UPLOAD_BYTES);
        pipeline.select_file(FileMeta::new("a.txt", 100)).unwrap();
        pipeline.begin_transfer();
        pipeline.set_progress(70);
        let entry = pipeline
            .fail(UploadError::Transport("connection reset".into()))
            .expect("history entry");
        assert_eq!(pipeline.status(), UploadStatus::Failed);
        assert_eq!(pipeline.job().unwrap().progress, 0);
        assert_eq!(entry.outcome, UploadOutcome::Error);
        assert_eq!(entry.record_count, 0);
        // Failing twice does not emit twice.
        assert!(pipeline.fail(UploadError::Transport("again".into())).is_none());
        // Late progress reports after the failure are dropped.
        pipeline.set_progress(99);
        assert_eq!(pipeline.job().unwrap().progress, 0);
    }

    #[test]
    fn test_reset_only_from_terminal() {
        let mut pipeline = UploadPipeline::new(DEFAULT_MAX_UPLOAD_BYTES);
        pipeline.select_file(FileMeta::new("a.txt", 100)).unwrap();
        pipeline.begin_transfer();
        // Reset on a running job is a no-op.
        pipeline.reset();
        assert_eq!(pipeline.status(), UploadStatus::Uploading);
        pipeline.server_ack();
        pipeline.complete(result_with(10)).unwrap();
        pipeline.reset();
        assert_eq!(pipeline.status(), UploadStatus::Idle);
    }

    #[test]
    fn test_out_of_phase_signals_are_ignored() {
        let mut pipeline = UploadPipeline::new(DEFAULT_MAX_UPLOAD_BYTES);
        // Nothing happens on an idle pipeline.
        pipeline.begin_transfer();
        pipeline.set_progress(50);
        pipeline.server_ack();
        assert_eq!(pipeline.status(), UploadStatus::Idle);
        // A result cannot skip the Processing phase.
        pipeline.select_file(FileMeta::new("a.txt", 100)).unwrap();
        pipeline.begin_transfer();
        assert!(pipeline.complete(result_with(10)).is_none());
        assert_eq!(pipeline.status(), UploadStatus::Uploading);
    }
}

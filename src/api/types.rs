//! Wire types for the HOT22 ingestion backend.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::report::{RecordError, ValidationError};
use crate::upload::{ProcessingResult, TypeCounts};

/// One parsed HOT22 record as returned by the list endpoint. Record types
/// carry different field sets, so everything beyond the common columns stays
/// as raw JSON.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRow {
    pub id: String,
    pub record_type: String,
    #[serde(default)]
    pub agent_code: Option<String>,
    #[serde(default)]
    pub line_number: Option<u64>,
    #[serde(default)]
    pub transaction_number: Option<String>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Server-side pagination metadata.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub limit: usize,
}

/// Response of the record list endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct ListResponse {
    pub data: Vec<RecordRow>,
    pub pagination: PaginationMeta,
}

/// Per-record-type counters in the upload summary.
#[derive(Clone, Debug, Deserialize)]
pub struct RawTypeCounts {
    pub processed: u64,
    pub saved: u64,
    pub errors: u64,
}

/// Summary block of an upload response.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub total_processed: u64,
    pub total_saved: u64,
    pub total_errors: u64,
    /// Server-side processing time in milliseconds.
    pub processing_time: u64,
    #[serde(default)]
    pub record_types: BTreeMap<String, RawTypeCounts>,
}

/// One line that failed schema checks, as reported by the backend.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawValidationError {
    pub line_number: u64,
    pub message: String,
    #[serde(default)]
    pub raw_line: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Errors for one record type in the upload response.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawErrorGroup {
    pub total_errors: u64,
    #[serde(default)]
    pub validation_errors: Vec<RawValidationError>,
    #[serde(default)]
    pub save_errors: Vec<String>,
}

/// `results` block of the upload endpoint.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResults {
    pub summary: UploadSummary,
    #[serde(default)]
    pub errors_by_type: BTreeMap<String, RawErrorGroup>,
}

/// Full upload response.
#[derive(Clone, Debug, Deserialize)]
pub struct UploadResponse {
    pub results: UploadResults,
}

impl UploadResults {
    /// Convert the summary into the immutable result held by the pipeline.
    pub fn processing_result(&self) -> ProcessingResult {
        ProcessingResult {
            total_processed: self.summary.total_processed,
            total_saved: self.summary.total_saved,
            total_errors: self.summary.total_errors,
            processing_time_ms: self.summary.processing_time,
            record_type_counts: self
                .summary
                .record_types
                .iter()
                .map(|(record_type, c)| {
                    (record_type.clone(), TypeCounts {
                        processed: c.processed,
                        saved: c.saved,
                        errors: c.errors,
                    })
                })
                .collect(),
        }
    }

    /// Flatten `errorsByType` into the raw error list consumed by
    /// `report::aggregate`.
    pub fn record_errors(&self) -> Vec<(String, RecordError)> {
        let mut raw = Vec::new();
        for (record_type, group) in &self.errors_by_type {
            for v in &group.validation_errors {
                raw.push((
                    record_type.clone(),
                    RecordError::Validation(ValidationError {
                        line_number: v.line_number,
                        message: v.message.clone(),
                        raw_line: v.raw_line.clone(),
                        details: v.details.as_ref().map(|d| d.to_string()),
                    }),
                ));
            }
            for s in &group.save_errors {
                raw.push((record_type.clone(), RecordError::Save(s.clone())));
            }
        }
        raw
    }
}

/// Response of the stats endpoint.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_records: u64,
    /// Number of backing record collections.
    pub collections: u64,
    #[serde(default)]
    pub statistics: BTreeMap<String, u64>,
}

/// Response of the delete-all endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

/// Backend health as reported by the health endpoint.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Response of the health endpoint.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_decodes_and_flattens() {
        let body = serde_json::json!({
            "results": {
                "summary": {
                    "totalProcessed": 120,
                    "totalSaved": 117,
                    "totalErrors": 3,
                    "processingTime": 842,
                    "recordTypes": {
                        "BKS24": {"processed": 80, "saved": 78, "errors": 2},
                        "BAR65": {"processed": 40, "saved": 39, "errors": 1}
                    }
                },
                "errorsByType": {
                    "BKS24": {
                        "totalErrors": 2,
                        "validationErrors": [
                            {"lineNumber": 12, "message": "bad amount", "rawLine": "BKS24..."}
                        ],
                        "saveErrors": ["duplicate key"]
                    }
                }
            }
        });
        let resp: UploadResponse = serde_json::from_value(body).unwrap();
        let result = resp.results.processing_result();
        assert_eq!(result.total_processed, 120);
        assert_eq!(result.processing_time_ms, 842);
        assert_eq!(result.record_type_counts.len(), 2);

        let raw = resp.results.record_errors();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].0, "BKS24");
        let groups = crate::report::aggregate(&raw);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].total_errors, 2);
    }

    #[test]
    fn test_list_response_decodes() {
        let body = serde_json::json!({
            "data": [
                {
                    "id": "66f0",
                    "recordType": "BKS24",
                    "agentCode": "9120001",
                    "lineNumber": 4,
                    "documentNumber": "220-1234567890"
                }
            ],
            "pagination": {
                "currentPage": 2,
                "totalPages": 5,
                "totalRecords": 95,
                "hasNextPage": true,
                "hasPrevPage": true,
                "limit": 20
            }
        });
        let resp: ListResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.data.len(), 1);
        assert_eq!(resp.data[0].record_type, "BKS24");
        // Type-specific columns stay available as raw JSON.
        assert!(resp.data[0].fields.contains_key("documentNumber"));
        assert_eq!(resp.pagination.total_records, 95);
    }

    #[test]
    fn test_health_status_decodes() {
        let resp: HealthResponse =
            serde_json::from_value(serde_json::json!({"status": "degraded", "uptimeSeconds": 90}))
                .unwrap();
        assert_eq!(resp.status, HealthStatus::Degraded);
    }
}

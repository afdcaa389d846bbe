//! Aggregation of per-record errors reported by the backend after an upload,
//! and the severity banding shown in the result summary.

use thiserror::Error;

/// One HOT22 line that failed schema checks server-side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    pub line_number: u64,
    pub message: String,
    pub raw_line: String,
    pub details: Option<String>,
}

/// A record-level error. Both kinds are non-fatal to the upload as a whole;
/// they are aggregated into the result even on successful completion.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// Structural/schema failure before persistence.
    #[error("line {}: {}", .0.line_number, .0.message)]
    Validation(ValidationError),
    /// A structurally valid record that failed to persist.
    #[error("save failed: {0}")]
    Save(String),
}

/// Errors for one record type, as rendered in the upload result panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorGroup {
    pub record_type: String,
    pub total_errors: usize,
    pub validation_errors: Vec<ValidationError>,
    pub save_errors: Vec<String>,
}

/// Group a flat error list by record type.
///
/// Grouping is stable: record types appear in first-seen order of the input,
/// and within a group errors keep their input order. The result is never
/// mutated afterwards.
pub fn aggregate(raw: &[(String, RecordError)]) -> Vec<ErrorGroup> {
    let mut groups: Vec<ErrorGroup> = Vec::new();
    for (record_type, error) in raw {
        let group = match groups.iter_mut().find(|g| g.record_type == *record_type) {
            Some(g) => g,
            None => {
                groups.push(ErrorGroup {
                    record_type: record_type.clone(),
                    total_errors: 0,
                    validation_errors: vec![],
                    save_errors: vec![],
                });
                groups.last_mut().unwrap_or_else(|| unreachable!())
            }
        };
        match error {
            RecordError::Validation(v) => group.validation_errors.push(v.clone()),
            RecordError::Save(msg) => group.save_errors.push(msg.clone()),
        }
        group.total_errors = group.validation_errors.len() + group.save_errors.len();
    }
    groups
}

/// Severity of an upload by error rate. Monotonic in the rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Critical,
    /// No records processed at all; a rate cannot be computed.
    Unknown,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unknown => "unknown",
        }
    }
}

/// Classify an error count against the number of processed records.
///
/// Bands (rate in percent): 0 → None, (0,5] → Low, (5,20] → Medium,
/// (20,50] → High, >50 → Critical.
pub fn severity(error_count: u64, total_records: u64) -> Severity {
    if total_records == 0 {
        return Severity::Unknown;
    }
    if error_count == 0 {
        return Severity::None;
    }
    let rate = error_count as f64 * 100.0 / total_records as f64;
    if rate <= 5.0 {
        Severity::Low
    } else if rate <= 20.0 {
        Severity::Medium
    } else if rate <= 50.0 {
        Severity::High
    } else {
        Severity::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(line: u64, message: &str) -> RecordError {
        RecordError::Validation(ValidationError {
            line_number: line,
            message: message.into(),
            raw_line: format!("BKS24...{line}"),
            details: None,
        })
    }

    #[test]
    fn test_aggregate_groups_in_first_seen_order() {
        let raw = vec![
            ("BKS24".to_string(), validation(10, "bad amount")),
            ("BAR65".to_string(), RecordError::Save("duplicate key".into())),
            ("BKS24".to_string(), validation(12, "bad currency")),
            ("BKP84".to_string(), validation(30, "short line")),
            ("BAR65".to_string(), validation(44, "bad agent code")),
        ];
        let groups = aggregate(&raw);
        let order: Vec<&str> = groups.iter().map(|g| g.record_type.as_str()).collect();
        assert_eq!(order, vec!["BKS24", "BAR65", "BKP84"]);
        assert_eq!(groups[0].total_errors, 2);
        assert_eq!(groups[0].validation_errors.len(), 2);
        assert!(groups[0].save_errors.is_empty());
        assert_eq!(groups[1].total_errors, 2);
        assert_eq!(groups[1].validation_errors.len(), 1);
        assert_eq!(groups[1].save_errors, vec!["duplicate key".to_string()]);
        // Errors keep their input order within a group.
        assert_eq!(groups[0].validation_errors[0].line_number, 10);
        assert_eq!(groups[0].validation_errors[1].line_number, 12);
    }

    #[test]
    fn test_aggregate_empty_input() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(severity(0, 100), Severity::None);
        assert_eq!(severity(1, 100), Severity::Low);
        assert_eq!(severity(5, 100), Severity::Low);
        assert_eq!(severity(6, 100), Severity::Medium);
        assert_eq!(severity(20, 100), Severity::Medium);
        assert_eq!(severity(21, 100), Severity::High);
        assert_eq!(severity(50, 100), Severity::High);
        assert_eq!(severity(51, 100), Severity::Critical);
        assert_eq!(severity(60, 100), Severity::Critical);
        assert_eq!(severity(7, 0), Severity::Unknown);
        assert_eq!(severity(0, 0), Severity::Unknown);
    }

    #[test]
    fn test_severity_is_monotonic() {
        // Raising the error count never lowers the severity.
        let mut last = Severity::None;
        for errors in 0..=200u64 {
            let s = severity(errors, 200);
            assert!(s >= last, "severity dropped at {errors} errors");
            last = s;
        }
    }
}

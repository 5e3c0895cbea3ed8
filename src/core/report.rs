use crate::core::{Storage, SyncReport};
use crate::utils::error::{Result, SyncError};
use serde::Serialize;

pub const REPORT_FORMATS: [&str; 2] = ["csv", "json"];

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    timestamp: String,
    level: String,
    kind: &'a str,
    device: &'a str,
    message: &'a str,
}

/// Writes run reports through a [`Storage`] backend.
pub struct ReportWriter<S: Storage> {
    storage: S,
}

impl<S: Storage> ReportWriter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn to_csv(report: &SyncReport) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for notification in &report.notifications {
            let kind = serde_json::to_value(notification.kind)?;
            writer.serialize(CsvRow {
                timestamp: notification.timestamp.to_rfc3339(),
                level: notification.level.to_string(),
                kind: kind.as_str().unwrap_or_default(),
                device: &notification.device,
                message: &notification.message,
            })?;
        }
        // An empty report still gets a header line.
        if report.notifications.is_empty() {
            writer.write_record(["timestamp", "level", "kind", "device", "message"])?;
        }

        let bytes = writer.into_inner().map_err(|e| SyncError::IoError(e.into_error()))?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Writes `<job>_report.<format>` for each requested format and returns
    /// the file names written.
    pub async fn write(&self, report: &SyncReport, formats: &[String]) -> Result<Vec<String>> {
        let mut written = Vec::new();

        for format in formats {
            let filename = format!("{}_report.{}", report.job, format);
            let data = match format.as_str() {
                "csv" => Self::to_csv(report)?,
                "json" => serde_json::to_string_pretty(report)?,
                other => {
                    return Err(SyncError::InvalidConfigValueError {
                        field: "report.formats".to_string(),
                        value: other.to_string(),
                        reason: format!("Valid formats: {}", REPORT_FORMATS.join(", ")),
                    })
                }
            };

            tracing::debug!("Writing {} ({} bytes)", filename, data.len());
            self.storage.write_file(&filename, data.as_bytes()).await?;
            written.push(filename);
        }

        Ok(written)
    }
}

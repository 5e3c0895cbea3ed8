use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned {status} for {url}: {body}")]
    ApiStatusError {
        status: u16,
        url: String,
        body: String,
    },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Report is not valid UTF-8: {0}")]
    EncodingError(#[from] std::string::FromUtf8Error),

    #[error("Invalid regex for {field}: {source}")]
    RegexError {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Malformed {method} snapshot for device {device}: {message}")]
    SnapshotError {
        method: String,
        device: u64,
        message: String,
    },

    #[error("Inventory conflict: {message}")]
    ConflictError { message: String },

    #[error("Inventory record not found: {message}")]
    NotFoundError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Inventory,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit status for a run that ended with an error of this
    /// severity: 2 for retryable network trouble, 1 for bad input or
    /// rejected writes, 3 for local system failures.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::ApiError(_) | SyncError::ApiStatusError { .. } => ErrorCategory::Network,
            SyncError::RegexError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            SyncError::CsvError(_)
            | SyncError::SerializationError(_)
            | SyncError::EncodingError(_)
            | SyncError::SnapshotError { .. } => ErrorCategory::Data,
            SyncError::ConflictError { .. } | SyncError::NotFoundError { .. } => {
                ErrorCategory::Inventory
            }
            SyncError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Inventory => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SyncError::ApiError(_) => "Check that NetBox is reachable and the request timeout is large enough",
            SyncError::ApiStatusError { status: 401 | 403, .. } => {
                "Check that the API token is valid and has write permission on dcim objects"
            }
            SyncError::ApiStatusError { .. } => {
                "Inspect the NetBox response body; NAPALM errors usually mean the device platform or credentials are wrong"
            }
            SyncError::RegexError { .. } => "Fix the regular expression syntax",
            SyncError::InvalidConfigValueError { .. }
            | SyncError::ConfigValidationError { .. } => "Review the command line flags or the TOML configuration",
            SyncError::SnapshotError { .. } => {
                "Check the NAPALM driver output for this device, or the captured live-state file"
            }
            SyncError::ConflictError { .. } => {
                "Another change touched the same interface or cable; re-run the job"
            }
            SyncError::NotFoundError { .. } => "The record was removed while the job was running; re-run the job",
            SyncError::CsvError(_) | SyncError::SerializationError(_) | SyncError::EncodingError(_) => {
                "Check the report output directory and the data being written"
            }
            SyncError::IoError(_) => "Check file permissions and free disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not talk to NetBox: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Data => format!("Unexpected data: {}", self),
            ErrorCategory::Inventory => format!("Inventory update rejected: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_are_network_category() {
        let err = SyncError::ApiStatusError {
            status: 403,
            url: "http://netbox/api/dcim/cables/".to_string(),
            body: "forbidden".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.severity().exit_code(), 2);
        assert!(err.recovery_suggestion().contains("token"));
    }

    #[test]
    fn test_conflict_is_inventory_error() {
        let err = SyncError::ConflictError {
            message: "interface 3 already has cable 7".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Inventory);
        assert!(err.user_friendly_message().starts_with("Inventory update rejected"));
    }

    #[test]
    fn test_exit_codes_follow_severity() {
        let io = SyncError::IoError(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(io.severity(), ErrorSeverity::Critical);
        assert_eq!(io.severity().exit_code(), 3);

        let config = SyncError::InvalidConfigValueError {
            field: "report.formats".to_string(),
            value: "zip".to_string(),
            reason: "Valid formats: csv, json".to_string(),
        };
        assert_eq!(config.severity().exit_code(), 1);
    }

    #[test]
    fn test_invalid_utf8_is_data_error() {
        let err: SyncError = String::from_utf8(vec![0xff, 0xfe]).unwrap_err().into();
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity().exit_code(), 1);
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected status {status} from {url}")]
    Protocol { status: u16, url: String },

    #[error("Malformed document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Cache I/O error: {0}")]
    CacheIo(#[from] std::io::Error),

    #[error("No endpoint available for {0}")]
    NoEndpoint(String),
}

/// Maximum length for error details carried in messages
const MAX_ERROR_DETAIL_LENGTH: usize = 500;

impl SyncError {
    /// Truncate a message to avoid logging excessive data
    fn truncate_detail(detail: &str) -> String {
        if detail.len() <= MAX_ERROR_DETAIL_LENGTH {
            detail.to_string()
        } else {
            let mut end = MAX_ERROR_DETAIL_LENGTH;
            while !detail.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &detail[..end], detail.len())
        }
    }

    pub fn network(detail: impl AsRef<str>) -> Self {
        SyncError::Network(Self::truncate_detail(detail.as_ref()))
    }

    pub fn from_status(status: u16, url: &str) -> Self {
        SyncError::Protocol {
            status,
            url: url.to_string(),
        }
    }

    /// Whether the next mirror should be tried after this error
    pub fn is_mirror_recoverable(&self) -> bool {
        matches!(self, SyncError::Network(_) | SyncError::Protocol { .. })
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_detail_long_message() {
        let long = "x".repeat(MAX_ERROR_DETAIL_LENGTH + 20);
        let err = SyncError::network(&long);
        let msg = err.to_string();
        assert!(msg.contains("truncated"));
        assert!(msg.contains(&format!("{} total bytes", long.len())));
    }

    #[test]
    fn test_truncate_detail_respects_char_boundary() {
        // Multi-byte chars straddling the cut point must not panic
        let long = "é".repeat(MAX_ERROR_DETAIL_LENGTH);
        let err = SyncError::network(&long);
        assert!(err.to_string().starts_with("Network error: é"));
    }

    #[test]
    fn test_mirror_recoverable() {
        assert!(SyncError::network("reset").is_mirror_recoverable());
        assert!(SyncError::from_status(503, "https://a/x").is_mirror_recoverable());
        assert!(!SyncError::NoEndpoint("x".into()).is_mirror_recoverable());
    }
}

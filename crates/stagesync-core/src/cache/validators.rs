//! Conditional request validators keyed by exact request URL.
//!
//! A validator record is written only after a 200 response and read before
//! every request to the same URL. Records are mirror-specific: the same
//! document on two mirrors has two records.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl ValidatorRecord {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let record = Self {
            entity_tag: read(header::ETAG),
            last_modified: read(header::LAST_MODIFIED),
        };

        if record.entity_tag.is_none() && record.last_modified.is_none() {
            None
        } else {
            Some(record)
        }
    }
}

pub struct ValidatorStore {
    path: PathBuf,
    records: RwLock<HashMap<String, ValidatorRecord>>,
}

impl ValidatorStore {
    /// Open the store persisted at `path`. A missing or unreadable file
    /// starts an empty store.
    pub fn open(path: PathBuf) -> Self {
        let records = match Self::load(&path) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding unreadable validator store");
                HashMap::new()
            }
        };
        debug!(path = %path.display(), count = records.len(), "Validator store opened");

        Self {
            path,
            records: RwLock::new(records),
        }
    }

    fn load(path: &Path) -> Result<HashMap<String, ValidatorRecord>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read validator store: {}", path.display()))?;
        let records = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse validator store: {}", path.display()))?;
        Ok(records)
    }

    fn save(&self, records: &HashMap<String, ValidatorRecord>) {
        let write = || -> Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(records)?;
            std::fs::write(&self.path, contents)?;
            Ok(())
        };
        if let Err(e) = write() {
            warn!(path = %self.path.display(), error = %e, "Failed to persist validators");
        }
    }

    /// Get a copy of the record for `url`, if any
    pub fn record(&self, url: &str) -> Option<ValidatorRecord> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned()
    }

    /// Conditional headers for `url`; empty when no validator is known.
    pub fn conditional_headers(&self, url: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let Some(record) = self.record(url) else {
            return headers;
        };

        if let Some(value) = record
            .entity_tag
            .as_deref()
            .and_then(|v| HeaderValue::from_str(v).ok())
        {
            headers.insert(header::IF_NONE_MATCH, value);
        }
        if let Some(value) = record
            .last_modified
            .as_deref()
            .and_then(|v| HeaderValue::from_str(v).ok())
        {
            headers.insert(header::IF_MODIFIED_SINCE, value);
        }
        headers
    }

    /// Record validators from a 200 response. A response carrying any
    /// validator replaces the whole record, so a validator the new response
    /// omits is dropped. Responses without validators leave the previous
    /// record in place.
    pub fn update_validators(&self, url: &str, response_headers: &HeaderMap) {
        let Some(record) = ValidatorRecord::from_headers(response_headers) else {
            debug!(url = url, "Response carried no validators");
            return;
        };

        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        if records.get(url) == Some(&record) {
            return;
        }
        records.insert(url.to_string(), record);
        self.save(&records);
    }

    /// Drop the record for a single URL
    pub fn forget(&self, url: &str) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        if records.remove(url).is_some() {
            self.save(&records);
        }
    }

    /// Drop every record, forcing unconditional requests.
    pub fn invalidate(&self) {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "Failed to delete validator store");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const URL: &str = "https://mirror-a.example/api/gui/StageActivityV2.json";

    fn headers(etag: Option<&str>, last_modified: Option<&str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(v) = etag {
            h.insert(header::ETAG, HeaderValue::from_str(v).unwrap());
        }
        if let Some(v) = last_modified {
            h.insert(header::LAST_MODIFIED, HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn test_no_validator_means_no_headers() {
        let dir = TempDir::new().unwrap();
        let store = ValidatorStore::open(dir.path().join("validators.json"));
        assert!(store.conditional_headers(URL).is_empty());
    }

    #[test]
    fn test_update_then_conditional_headers() {
        let dir = TempDir::new().unwrap();
        let store = ValidatorStore::open(dir.path().join("validators.json"));
        store.update_validators(
            URL,
            &headers(Some("\"v1\""), Some("Wed, 21 Oct 2026 07:28:00 GMT")),
        );

        let h = store.conditional_headers(URL);
        assert_eq!(h.get(header::IF_NONE_MATCH).unwrap(), "\"v1\"");
        assert_eq!(
            h.get(header::IF_MODIFIED_SINCE).unwrap(),
            "Wed, 21 Oct 2026 07:28:00 GMT"
        );
        // Keyed by exact URL
        assert!(store
            .conditional_headers("https://mirror-b.example/api/gui/StageActivityV2.json")
            .is_empty());
    }

    #[test]
    fn test_missing_validators_keep_previous_record() {
        let dir = TempDir::new().unwrap();
        let store = ValidatorStore::open(dir.path().join("validators.json"));
        store.update_validators(URL, &headers(Some("\"v1\""), None));
        store.update_validators(URL, &headers(None, None));
        assert_eq!(
            store.record(URL).unwrap().entity_tag.as_deref(),
            Some("\"v1\"")
        );
    }

    #[test]
    fn test_new_validators_replace_whole_record() {
        let dir = TempDir::new().unwrap();
        let store = ValidatorStore::open(dir.path().join("validators.json"));
        store.update_validators(
            URL,
            &headers(Some("\"v1\""), Some("Wed, 21 Oct 2026 07:28:00 GMT")),
        );
        store.update_validators(URL, &headers(Some("\"v2\""), None));

        let record = store.record(URL).unwrap();
        assert_eq!(record.entity_tag.as_deref(), Some("\"v2\""));
        assert_eq!(record.last_modified, None);
        assert!(store
            .conditional_headers(URL)
            .get(header::IF_MODIFIED_SINCE)
            .is_none());
    }

    #[test]
    fn test_persisted_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("validators.json");
        {
            let store = ValidatorStore::open(path.clone());
            store.update_validators(URL, &headers(Some("\"v2\""), None));
        }
        let reopened = ValidatorStore::open(path);
        assert_eq!(reopened.len(), 1);
        assert_eq!(
            reopened.conditional_headers(URL).get(header::IF_NONE_MATCH).unwrap(),
            "\"v2\""
        );
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("validators.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = ValidatorStore::open(path);
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalidate_and_forget() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("validators.json");
        let store = ValidatorStore::open(path.clone());
        store.update_validators(URL, &headers(Some("\"v1\""), None));
        store.update_validators("https://other/x", &headers(Some("\"o\""), None));

        store.forget(URL);
        assert!(store.record(URL).is_none());
        assert_eq!(store.len(), 1);

        store.invalidate();
        assert!(store.is_empty());
        assert!(!path.exists());
    }
}

//! Mirror-by-mirror document sync with a last-known-good fallback.
//!
//! For one logical path the mirrors are tried strictly in order. The first
//! mirror that answers 200 or 304 ends the walk; transport faults, timeouts
//! and unexpected statuses move on to the next mirror. When every mirror has
//! failed the layered cache answers instead.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::api::{FetchClient, HttpTransport, SyncError};
use crate::cache::{LayeredCache, ValidatorStore};
use crate::config::{SyncConfig, DEFAULT_ATTEMPT_TIMEOUT_SECS};

use super::DocumentSource;

/// Where a returned document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// 200 from a mirror
    Network,
    /// 304 from a mirror, body served from cache
    NotModified,
    /// Every mirror failed, last known good copy
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Fetched {
    pub body: String,
    pub source: Source,
    /// Base URL of the mirror that answered, if any
    pub mirror: Option<String>,
}

pub struct ResourceSync<T: HttpTransport> {
    transport: T,
    mirrors: Vec<String>,
    validators: Arc<ValidatorStore>,
    cache: Arc<LayeredCache>,
    attempt_timeout: Duration,
}

impl ResourceSync<FetchClient> {
    /// Wire the reqwest transport and both cache layers from configuration
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let transport = FetchClient::with_timeout(config.request_timeout())?;
        let validators = Arc::new(ValidatorStore::open(config.validators_path()?));
        let cache = Arc::new(LayeredCache::new(config.body_cache_dir()?)?);

        Ok(Self::new(transport, config.mirrors.clone(), validators, cache)
            .with_attempt_timeout(config.attempt_timeout()))
    }
}

impl<T: HttpTransport> ResourceSync<T> {
    pub fn new(
        transport: T,
        mirrors: Vec<String>,
        validators: Arc<ValidatorStore>,
        cache: Arc<LayeredCache>,
    ) -> Self {
        Self {
            transport,
            mirrors,
            validators,
            cache,
            attempt_timeout: Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
        }
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    pub fn cache(&self) -> &Arc<LayeredCache> {
        &self.cache
    }

    pub fn validators(&self) -> &Arc<ValidatorStore> {
        &self.validators
    }

    fn mirror_url(base: &str, path: &str) -> String {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Fetch `path`, trying each mirror in turn. With `allow_fallback` the
    /// cached copy is returned when no mirror succeeds.
    pub async fn fetch_resource(&self, path: &str, allow_fallback: bool) -> Result<Fetched, SyncError> {
        for base in &self.mirrors {
            let url = Self::mirror_url(base, path);

            let attempt = tokio::time::timeout(self.attempt_timeout, self.try_mirror(&url, path)).await;
            let outcome = match attempt {
                Ok(outcome) => outcome,
                Err(_) => Err(SyncError::network(format!(
                    "attempt timed out after {}ms",
                    self.attempt_timeout.as_millis()
                ))),
            };

            match outcome {
                Ok((body, source)) => {
                    return Ok(Fetched {
                        body,
                        source,
                        mirror: Some(base.clone()),
                    });
                }
                Err(e) if e.is_mirror_recoverable() => {
                    warn!(url = %url, error = %e, "Mirror failed, trying next");
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Mirror response rejected, trying next");
                }
            }
        }

        if allow_fallback {
            if let Some(body) = self.cache.get(path) {
                info!(path = path, "All mirrors failed, serving cached copy");
                return Ok(Fetched {
                    body,
                    source: Source::Fallback,
                    mirror: None,
                });
            }
        }

        warn!(path = path, allow_fallback, "No endpoint available");
        Err(SyncError::NoEndpoint(path.to_string()))
    }

    /// Latest body for `path`, or `None` when no mirror answered and no
    /// usable fallback exists.
    pub async fn request_with_cache(&self, path: &str, allow_fallback: bool) -> Option<String> {
        self.fetch_resource(path, allow_fallback)
            .await
            .ok()
            .map(|fetched| fetched.body)
    }

    async fn try_mirror(&self, url: &str, key: &str) -> Result<(String, Source), SyncError> {
        let headers = self.validators.conditional_headers(url);
        let conditional = !headers.is_empty();
        let response = self.transport.get(url, &[], headers).await?;

        match response.status {
            200 => {
                let response_headers = response.headers.clone();
                let body = response.text().await?;
                if key.ends_with(".json") {
                    serde_json::from_str::<serde::de::IgnoredAny>(&body)?;
                }

                // Body before validators: a validator must never point at a missing body
                self.cache.put(key, &body);
                self.validators.update_validators(url, &response_headers);
                debug!(url = url, bytes = body.len(), "Request succeeded");
                Ok((body, Source::Network))
            }
            304 if conditional => match self.cache.get(key) {
                Some(body) => {
                    debug!(url = url, "304 Not Modified");
                    Ok((body, Source::NotModified))
                }
                None => {
                    warn!(url = url, "304 without cached body, dropping validator");
                    self.validators.forget(url);
                    Err(SyncError::from_status(304, url))
                }
            },
            status => Err(SyncError::from_status(status, url)),
        }
    }

    /// The explicit "clear cache" action: wipe validators and bodies.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
        self.validators.invalidate();
        info!("Document caches cleared");
    }

    /// Durable location of a synced document. The automation engine reads
    /// task definitions from here on its own schedule.
    pub fn document_path(&self, path: &str) -> PathBuf {
        self.cache.path_for(path)
    }
}

impl<T: HttpTransport> DocumentSource for ResourceSync<T> {
    async fn fetch_document(&self, path: &str) -> Option<String> {
        self.request_with_cache(path, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FetchResponse;
    use reqwest::header::{self, HeaderMap, HeaderValue};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const MIRROR_A: &str = "https://mirror-a.example/api/";
    const MIRROR_B: &str = "https://mirror-b.example/api/";
    const DOC: &str = "gui/StageActivityV2.json";

    #[derive(Clone)]
    enum Behavior {
        Serve { body: String, etag: String },
        Status(u16),
        Refuse,
        Hang,
    }

    /// In-memory mirrors honoring If-None-Match
    #[derive(Default)]
    struct FakeMirrors {
        behaviors: Mutex<HashMap<String, Behavior>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeMirrors {
        fn set(&self, base: &str, behavior: Behavior) {
            self.behaviors
                .lock()
                .unwrap()
                .insert(base.to_string(), behavior);
        }

        fn calls_to(&self, base: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|url| url.starts_with(base))
                .count()
        }
    }

    impl HttpTransport for Arc<FakeMirrors> {
        async fn get(
            &self,
            url: &str,
            _query: &[(&str, &str)],
            headers: HeaderMap,
        ) -> Result<FetchResponse, SyncError> {
            self.calls.lock().unwrap().push(url.to_string());
            let behavior = self
                .behaviors
                .lock()
                .unwrap()
                .iter()
                .find(|(base, _)| url.starts_with(base.as_str()))
                .map(|(_, b)| b.clone());

            match behavior {
                Some(Behavior::Serve { body, etag }) => {
                    let matches = headers
                        .get(header::IF_NONE_MATCH)
                        .map(|v| v.as_bytes() == etag.as_bytes())
                        .unwrap_or(false);
                    if matches {
                        return Ok(FetchResponse::buffered(304, HeaderMap::new(), ""));
                    }
                    let mut response_headers = HeaderMap::new();
                    response_headers.insert(header::ETAG, HeaderValue::from_str(&etag).unwrap());
                    Ok(FetchResponse::buffered(200, response_headers, body))
                }
                Some(Behavior::Status(status)) => {
                    Ok(FetchResponse::buffered(status, HeaderMap::new(), "error"))
                }
                Some(Behavior::Hang) => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(SyncError::network("hung"))
                }
                Some(Behavior::Refuse) | None => Err(SyncError::network("connection refused")),
            }
        }
    }

    struct Harness {
        _dir: TempDir,
        mirrors: Arc<FakeMirrors>,
        sync: ResourceSync<Arc<FakeMirrors>>,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let mirrors = Arc::new(FakeMirrors::default());
        let validators = Arc::new(ValidatorStore::open(dir.path().join("validators.json")));
        let cache = Arc::new(LayeredCache::new(dir.path().join("resource-cache")).unwrap());
        let sync = ResourceSync::new(
            Arc::clone(&mirrors),
            vec![MIRROR_A.to_string(), MIRROR_B.to_string()],
            validators,
            cache,
        )
        .with_attempt_timeout(Duration::from_millis(50));
        Harness {
            _dir: dir,
            mirrors,
            sync,
        }
    }

    #[test]
    fn test_default_attempt_timeout_matches_config() {
        let dir = TempDir::new().unwrap();
        let sync = ResourceSync::new(
            Arc::new(FakeMirrors::default()),
            vec![MIRROR_A.to_string()],
            Arc::new(ValidatorStore::open(dir.path().join("validators.json"))),
            Arc::new(LayeredCache::new(dir.path().join("resource-cache")).unwrap()),
        );
        assert_eq!(sync.attempt_timeout(), SyncConfig::default().attempt_timeout());
        assert_eq!(harness().sync.attempt_timeout(), Duration::from_millis(50));
    }

    fn serve(body: &str, etag: &str) -> Behavior {
        Behavior::Serve {
            body: body.to_string(),
            etag: etag.to_string(),
        }
    }

    #[test]
    fn test_mirror_url_join() {
        type Sync = ResourceSync<Arc<FakeMirrors>>;
        assert_eq!(
            Sync::mirror_url("https://a/api/", "/gui/x.json"),
            "https://a/api/gui/x.json"
        );
        assert_eq!(Sync::mirror_url("https://a/api", "gui/x.json"), "https://a/api/gui/x.json");
    }

    #[tokio::test]
    async fn test_timeout_on_first_mirror_falls_over_to_second() {
        let h = harness();
        h.mirrors.set(MIRROR_A, Behavior::Hang);
        h.mirrors.set(MIRROR_B, serve(r#"{"from":"b"}"#, "\"b1\""));

        let fetched = h.sync.fetch_resource(DOC, true).await.unwrap();
        assert_eq!(fetched.body, r#"{"from":"b"}"#);
        assert_eq!(fetched.source, Source::Network);
        assert_eq!(fetched.mirror.as_deref(), Some(MIRROR_B));

        assert_eq!(h.mirrors.calls_to(MIRROR_A), 1);
        assert_eq!(h.mirrors.calls_to(MIRROR_B), 1);
        assert_eq!(h.sync.cache().get(DOC).as_deref(), Some(r#"{"from":"b"}"#));
    }

    #[tokio::test]
    async fn test_first_success_stops_the_walk() {
        let h = harness();
        h.mirrors.set(MIRROR_A, serve("{}", "\"a1\""));
        h.mirrors.set(MIRROR_B, serve("{}", "\"b1\""));

        h.sync.fetch_resource(DOC, true).await.unwrap();
        assert_eq!(h.mirrors.calls_to(MIRROR_A), 1);
        assert_eq!(h.mirrors.calls_to(MIRROR_B), 0);
    }

    #[tokio::test]
    async fn test_total_failure_uses_fallback_only_when_allowed() {
        let h = harness();
        h.mirrors.set(MIRROR_A, Behavior::Refuse);
        h.mirrors.set(MIRROR_B, Behavior::Status(503));
        h.sync.cache().put(DOC, r#"{"cached":true}"#);

        assert_eq!(
            h.sync.request_with_cache(DOC, true).await.as_deref(),
            Some(r#"{"cached":true}"#)
        );
        let fetched = h.sync.fetch_resource(DOC, true).await.unwrap();
        assert_eq!(fetched.source, Source::Fallback);
        assert!(fetched.mirror.is_none());

        assert!(h.sync.request_with_cache(DOC, false).await.is_none());
        assert!(matches!(
            h.sync.fetch_resource(DOC, false).await,
            Err(SyncError::NoEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_total_failure_without_cache_is_no_endpoint() {
        let h = harness();
        let result = h.sync.fetch_resource(DOC, true).await;
        assert!(matches!(result, Err(SyncError::NoEndpoint(path)) if path == DOC));
    }

    #[tokio::test]
    async fn test_second_pass_is_not_modified_without_durable_write() {
        let h = harness();
        h.mirrors.set(MIRROR_A, serve(r#"{"v":1}"#, "\"v1\""));

        let first = h.sync.fetch_resource(DOC, true).await.unwrap();
        assert_eq!(first.source, Source::Network);
        let writes = h.sync.cache().durable_writes();
        let validator = h.sync.validators().record(&format!("{}{}", MIRROR_A, DOC));
        let file = std::fs::read_to_string(h.sync.document_path(DOC)).unwrap();

        let second = h.sync.fetch_resource(DOC, true).await.unwrap();
        assert_eq!(second.source, Source::NotModified);
        assert_eq!(second.body, first.body);
        assert_eq!(h.sync.cache().durable_writes(), writes);
        assert_eq!(
            h.sync.validators().record(&format!("{}{}", MIRROR_A, DOC)),
            validator
        );
        assert_eq!(std::fs::read_to_string(h.sync.document_path(DOC)).unwrap(), file);
    }

    #[tokio::test]
    async fn test_malformed_json_does_not_poison_cache() {
        let h = harness();
        h.mirrors.set(MIRROR_A, serve("<html>captive portal</html>", "\"x\""));
        h.mirrors.set(MIRROR_B, serve(r#"{"ok":1}"#, "\"b\""));

        let fetched = h.sync.fetch_resource(DOC, true).await.unwrap();
        assert_eq!(fetched.mirror.as_deref(), Some(MIRROR_B));
        assert_eq!(h.sync.cache().get(DOC).as_deref(), Some(r#"{"ok":1}"#));
        assert!(h.sync.validators().record(&format!("{}{}", MIRROR_A, DOC)).is_none());
    }

    #[tokio::test]
    async fn test_not_modified_without_body_heals() {
        let h = harness();
        h.mirrors.set(MIRROR_A, serve(r#"{"v":1}"#, "\"v1\""));
        h.sync.fetch_resource(DOC, true).await.unwrap();

        // Body lost while the validator survived
        h.sync.cache().invalidate();
        h.mirrors.set(MIRROR_B, Behavior::Refuse);

        assert!(h.sync.fetch_resource(DOC, true).await.is_err());
        let url = format!("{}{}", MIRROR_A, DOC);
        assert!(h.sync.validators().record(&url).is_none());

        // Next pass is unconditional and repopulates the cache
        let fetched = h.sync.fetch_resource(DOC, true).await.unwrap();
        assert_eq!(fetched.source, Source::Network);
        assert!(h.sync.cache().get(DOC).is_some());
    }

    #[tokio::test]
    async fn test_invalidate_cache_forces_unconditional_fetch() {
        let h = harness();
        h.mirrors.set(MIRROR_A, serve("{}", "\"v1\""));
        h.sync.fetch_resource(DOC, true).await.unwrap();

        h.sync.invalidate_cache();
        assert!(h.sync.validators().is_empty());
        assert!(h.sync.cache().get(DOC).is_none());

        let fetched = h.sync.fetch_resource(DOC, true).await.unwrap();
        assert_eq!(fetched.source, Source::Network);
    }

    #[tokio::test]
    async fn test_document_source_uses_fallback() {
        let h = harness();
        h.sync.cache().put("resource/tasks.json", "{}");
        assert_eq!(
            h.sync.fetch_document("resource/tasks.json").await.as_deref(),
            Some("{}")
        );
    }
}

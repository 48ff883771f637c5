use std::future::Future;

/// Narrow read capability the catalog builds on: "give me the latest text of
/// this logical document, or nothing".
pub trait DocumentSource: Send + Sync {
    fn fetch_document(&self, path: &str) -> impl Future<Output = Option<String>> + Send;
}

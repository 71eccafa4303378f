//! Report data provider trait and adapters.

use std::future::Future;
use std::pin::Pin;

use report_core::{GroupKey, ReportPayload};

/// Result type for provider queries.
pub type ProviderResult = Result<ReportPayload, String>;

/// Future type for async provider queries.
pub type ProviderFuture = Pin<Box<dyn Future<Output = ProviderResult> + Send>>;

/// Seam to the external report computation service.
///
/// The hub treats this as a black box: given a group key it returns the
/// current computed payload for that report kind, date range and data
/// type, or an error message. Queries are assumed to complete or fail
/// within bounded time.
pub trait ReportProvider: Send + Sync + 'static {
    /// Compute the current payload for a report group.
    fn fetch(&self, key: &GroupKey) -> ProviderFuture;
}

/// A simple function-based report provider.
pub struct FnProvider<F>
where
    F: Fn(&GroupKey) -> ProviderFuture + Send + Sync + 'static,
{
    fetch: F,
}

impl<F> FnProvider<F>
where
    F: Fn(&GroupKey) -> ProviderFuture + Send + Sync + 'static,
{
    /// Create a new function-based provider.
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

impl<F> ReportProvider for FnProvider<F>
where
    F: Fn(&GroupKey) -> ProviderFuture + Send + Sync + 'static,
{
    fn fetch(&self, key: &GroupKey) -> ProviderFuture {
        (self.fetch)(key)
    }
}

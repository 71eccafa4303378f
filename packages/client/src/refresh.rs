//! Stateless refresh used while the push transport is unavailable.

use std::future::Future;
use std::pin::Pin;

use report_core::ReportPayload;
use serde::Serialize;

use crate::messages::ActiveView;

/// Result type for refresh requests.
pub type RefreshResult = Result<ReportPayload, String>;

/// Future type for async refresh requests.
pub type RefreshFuture = Pin<Box<dyn Future<Output = RefreshResult> + Send>>;

/// Seam for the polling fallback's data fetch.
pub trait RefreshClient: Send + Sync + 'static {
    /// Fetch the current payload for the active report view.
    fn refresh(&self, view: &ActiveView) -> RefreshFuture;
}

/// Body of the refresh request, in the wire casing the endpoint expects.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    report_type: String,
    from_date: chrono::NaiveDate,
    to_date: chrono::NaiveDate,
    data_type: String,
}

/// HTTP refresh client posting to the report refresh endpoint.
///
/// Returns the same payload shape as the push path.
pub struct HttpRefreshClient {
    http: reqwest::Client,
    url: String,
}

impl HttpRefreshClient {
    /// Create a refresh client for the given endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl RefreshClient for HttpRefreshClient {
    fn refresh(&self, view: &ActiveView) -> RefreshFuture {
        let request = self.http.post(&self.url).json(&RefreshRequest {
            report_type: view.kind.as_str().to_string(),
            from_date: view.range.from,
            to_date: view.range.to,
            data_type: view.data_type.as_str().to_string(),
        });

        Box::pin(async move {
            let response = request.send().await.map_err(|e| e.to_string())?;
            let response = response.error_for_status().map_err(|e| e.to_string())?;
            response
                .json::<ReportPayload>()
                .await
                .map_err(|e| e.to_string())
        })
    }
}

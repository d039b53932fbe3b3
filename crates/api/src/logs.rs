//! Log file API (`/v2/logs`).

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::{ApiError, Result};
use crate::pagination::{with_query, CursorPage};
use crate::ApiClient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogFile {
    pub filename: String,
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default)]
    pub size: Option<u64>,
}

pub type LogFilePage = CursorPage<LogFile>;

/// The three remote operations the log downloader needs. Implemented by
/// [`RemoteLogArchive`]; tests substitute their own.
#[async_trait]
pub trait LogArchive: Sync {
    /// Lists one page of log files starting at `marker` (empty = beginning).
    async fn list_log_files(&self, marker: &str) -> Result<LogFilePage>;

    /// Returns a short-lived URL the file can be fetched from.
    async fn download_link(&self, filename: &str) -> Result<String>;

    /// Streams `url` into `destination`, returning the bytes written.
    async fn download(&self, url: &str, destination: &Path) -> Result<u64>;
}

impl ApiClient {
    pub async fn list_logs(&self, marker: &str, limit: Option<u32>) -> Result<LogFilePage> {
        self.get(&with_query("/v2/logs/list", &listing_query(marker, limit)))
            .await
    }

    /// The endpoint answers with the bare URL as plain text.
    pub async fn log_download_link(&self, filename: &str) -> Result<String> {
        let body = self
            .get_text(&format!(
                "/v2/logs/download/{}",
                urlencoding::encode(filename)
            ))
            .await?;
        let link = body.trim();
        if link.is_empty() {
            return Err(ApiError::InvalidResponse(format!(
                "empty download link for {filename}"
            )));
        }
        Ok(link.to_string())
    }
}

/// Query for `/v2/logs/list`. An empty marker is left off.
fn listing_query(marker: &str, limit: Option<u32>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if !marker.is_empty() {
        serializer.append_pair("marker", marker);
    }
    if let Some(limit) = limit {
        serializer.append_pair("limit", &limit.to_string());
    }
    serializer.finish()
}

/// [`ApiClient`] bound to a page size for log listings.
pub struct RemoteLogArchive<'a> {
    client: &'a ApiClient,
    page_size: Option<u32>,
}

impl<'a> RemoteLogArchive<'a> {
    pub fn new(client: &'a ApiClient, page_size: Option<u32>) -> Self {
        Self { client, page_size }
    }
}

#[async_trait]
impl LogArchive for RemoteLogArchive<'_> {
    async fn list_log_files(&self, marker: &str) -> Result<LogFilePage> {
        self.client.list_logs(marker, self.page_size).await
    }

    async fn download_link(&self, filename: &str) -> Result<String> {
        self.client.log_download_link(filename).await
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        self.client.download_to(url, destination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_listing_page() {
        let page: LogFilePage = serde_json::from_value(serde_json::json!({
            "data": [
                {"filename": "2024-03-09-10-00-00.json", "date": 1709978400000_i64, "size": 1024},
                {"filename": "2024-03-09-11-00-00.json"}
            ],
            "marker": "2024-03-09-11-00-00",
            "took": 0.05,
            "requestId": "abc"
        }))
        .unwrap();

        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[1].size, None);
        assert!(!page.is_last());
    }

    #[test]
    fn listing_query_omits_empty_marker() {
        assert_eq!(listing_query("", None), "");
        assert_eq!(listing_query("", Some(50)), "limit=50");
        assert_eq!(
            listing_query("2024-03-09-11-00-00", Some(50)),
            "marker=2024-03-09-11-00-00&limit=50"
        );
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn client_log_futures_are_send() {
        let client = ApiClient::new("https://api.opsgenie.com").unwrap();
        let destination = Path::new("out.json");

        // Built but never polled.
        assert_send(&client.list_logs("2024-03-09-11-00-00", Some(10)));
        assert_send(&client.log_download_link("2024-03-09-10-00-00.json"));
        assert_send(&client.download_to("https://example.com/file", destination));
    }
}

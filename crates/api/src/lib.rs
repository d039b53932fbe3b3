pub mod alerts;
pub mod error;
pub mod escalations;
pub mod heartbeats;
pub mod incidents;
pub mod integrations;
pub mod logs;
pub mod models;
pub mod pagination;
pub mod retry;
pub mod schedules;
pub mod services;
pub mod teams;
pub mod users;

use std::path::{Path, PathBuf};
use std::time::Duration;

use error::{ApiError, Result};
use futures::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use retry::{retry_with_backoff, RetryConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.opsgenie.com";

#[derive(Clone, Debug)]
pub enum AuthMethod {
    /// `Authorization: GenieKey <key>`
    GenieKey { key: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxySettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
}

impl ProxySettings {
    pub fn url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

/// Transport settings applied when the underlying HTTP client is built.
#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Replaces `request_timeout` for file downloads, which stream whole
    /// bodies and can run far longer than an API call.
    pub download_timeout: Duration,
    pub proxy: Option<ProxySettings>,
    pub retry: RetryConfig,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            download_timeout: Duration::from_secs(30 * 60),
            proxy: None,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    auth: Option<AuthMethod>,
    retry_config: RetryConfig,
    download_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_settings(base_url, &HttpSettings::default())
    }

    pub fn with_settings(base_url: impl AsRef<str>, settings: &HttpSettings) -> Result<Self> {
        let url = Url::parse(base_url.as_ref()).map_err(ApiError::InvalidUrl)?;

        let mut builder = Client::builder()
            .user_agent(format!("lamp/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout);

        if let Some(proxy) = &settings.proxy {
            let mut http_proxy = reqwest::Proxy::all(proxy.url())
                .map_err(|err| ApiError::InvalidProxy(err.to_string()))?;
            if let Some(username) = proxy.username.as_deref() {
                http_proxy =
                    http_proxy.basic_auth(username, proxy.password.as_deref().unwrap_or(""));
            }
            builder = builder.proxy(http_proxy);
        }

        let client = builder.build().map_err(ApiError::RequestFailed)?;

        Ok(Self {
            client,
            base_url: url,
            auth: None,
            retry_config: settings.retry.clone(),
            download_timeout: settings.download_timeout,
        })
    }

    pub fn with_genie_key(mut self, key: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::GenieKey { key: key.into() });
        self
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, Option::<&()>::None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::DELETE, path, Option::<&()>::None)
            .await
    }

    pub async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let joined = self.join(path)?;
        debug!(method = %method, url = %joined, "Sending request");

        retry_with_backoff(&self.retry_config, || async {
            let mut req = self.apply_auth(self.client.request(method.clone(), joined.clone()));
            if let Some(body) = body {
                req = req.json(body);
            }

            let response = req.send().await.map_err(ApiError::RequestFailed)?;
            let response = Self::check_status(response, &joined).await?;

            response.json::<T>().await.map_err(|e| {
                error!("Failed to parse JSON response: {}", e);
                ApiError::InvalidResponse(e.to_string())
            })
        })
        .await
    }

    /// GET returning the raw body, for endpoints that answer with plain text
    /// (log download links, iCalendar exports).
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let joined = self.join(path)?;
        debug!(url = %joined, "Sending text request");

        retry_with_backoff(&self.retry_config, || async {
            let req = self.apply_auth(self.client.get(joined.clone()));
            let response = req.send().await.map_err(ApiError::RequestFailed)?;
            let response = Self::check_status(response, &joined).await?;
            response.text().await.map_err(ApiError::RequestFailed)
        })
        .await
    }

    /// Multipart upload of a single file plus plain text fields.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        file_name: &str,
        content: Vec<u8>,
        fields: &[(&str, String)],
    ) -> Result<T> {
        let joined = self.join(path)?;
        debug!(url = %joined, file = %file_name, "Uploading file");

        retry_with_backoff(&self.retry_config, || async {
            let mut form = Form::new().part(
                "file",
                Part::bytes(content.clone()).file_name(file_name.to_string()),
            );
            for (name, value) in fields {
                form = form.text(name.to_string(), value.clone());
            }

            let req = self.apply_auth(self.client.post(joined.clone()).multipart(form));
            let response = req.send().await.map_err(ApiError::RequestFailed)?;
            let response = Self::check_status(response, &joined).await?;

            response
                .json::<T>()
                .await
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))
        })
        .await
    }

    /// Streams an absolute, pre-signed URL into `destination`. No credentials
    /// are sent and no retries are made. Returns the number of bytes written.
    pub async fn download_to(&self, url: &str, destination: &Path) -> Result<u64> {
        let url = Url::parse(url).map_err(ApiError::InvalidUrl)?;
        debug!(url = %url, destination = %destination.display(), "Downloading file");

        let response = self
            .client
            .get(url.clone())
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(ApiError::RequestFailed)?;
        let response = Self::check_status(response, &url).await?;

        write_body(response.bytes_stream(), destination).await
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.strip_prefix('/').unwrap_or(path))
            .map_err(ApiError::InvalidUrl)
    }

    async fn check_status(response: Response, url: &Url) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::AuthenticationFailed {
                message: Self::error_message(response, "Invalid or missing API key").await,
            }),
            StatusCode::FORBIDDEN => Err(ApiError::Forbidden {
                message: Self::error_message(response, "Forbidden").await,
            }),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound {
                resource: url.path().to_string(),
            }),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(ApiError::BadRequest {
                    message: Self::error_message(response, "Bad request").await,
                })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1);
                Err(ApiError::RateLimitExceeded { retry_after })
            }
            status => Err(ApiError::ServerError {
                status: status.as_u16(),
                message: Self::error_message(response, &format!("Unexpected status: {status}"))
                    .await,
            }),
        }
    }

    /// OpsGenie errors carry `{"message": ...}`; fall back to the raw body.
    async fn error_message(response: Response, fallback: &str) -> String {
        match response.text().await {
            Ok(text) if !text.trim().is_empty() => serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.message)
                .unwrap_or(text),
            _ => fallback.to_string(),
        }
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(AuthMethod::GenieKey { key }) => {
                request.header(reqwest::header::AUTHORIZATION, format!("GenieKey {key}"))
            }
            None => request,
        }
    }
}

/// Streams `body` into `<destination>.part` and renames it into place once
/// the stream ends. On failure the partial file is removed, so `destination`
/// only ever holds a complete body.
async fn write_body<S, B, E>(body: S, destination: &Path) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<ApiError>,
{
    let partial = partial_path(destination);
    let result = match stream_into(body, &partial).await {
        Ok(written) => tokio::fs::rename(&partial, destination)
            .await
            .map(|()| written)
            .map_err(ApiError::from),
        Err(err) => Err(err),
    };

    if result.is_err() {
        if let Err(err) = tokio::fs::remove_file(&partial).await {
            debug!(file = %partial.display(), error = %err, "Could not remove partial download");
        }
    }
    result
}

async fn stream_into<S, B, E>(body: S, path: &Path) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<ApiError>,
{
    futures::pin_mut!(body);
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(Into::<ApiError>::into)?;
        let chunk = chunk.as_ref();
        file.write_all(chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn proxy_url_follows_tls_flag() {
        let mut proxy = ProxySettings {
            host: "proxy.local".to_string(),
            port: 3128,
            username: None,
            password: None,
            tls: false,
        };
        assert_eq!(proxy.url(), "http://proxy.local:3128");
        proxy.tls = true;
        assert_eq!(proxy.url(), "https://proxy.local:3128");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn joins_paths_against_base_url() {
        let client = ApiClient::new("https://api.eu.opsgenie.com").unwrap();
        let url = client.join("/v2/alerts?limit=1").unwrap();
        assert_eq!(url.as_str(), "https://api.eu.opsgenie.com/v2/alerts?limit=1");
    }

    #[tokio::test]
    async fn interrupted_body_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("2024-03-01-00-00-00.json");
        let body = futures::stream::iter(vec![
            Ok(b"{\"alertId\":".to_vec()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
        ]);

        let err = write_body(body, &destination).await.unwrap_err();

        assert!(matches!(err, ApiError::Io(_)));
        assert!(!destination.exists());
        assert!(!partial_path(&destination).exists());
    }

    #[tokio::test]
    async fn complete_body_is_renamed_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("2024-03-01-00-00-00.json");
        let body = futures::stream::iter(vec![
            Ok::<_, io::Error>(b"[1,".to_vec()),
            Ok(b"2]".to_vec()),
        ]);

        let written = write_body(body, &destination).await.unwrap();

        assert_eq!(written, 5);
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "[1,2]");
        assert!(!partial_path(&destination).exists());
    }

    #[test]
    fn downloads_outlast_api_calls_by_default() {
        let settings = HttpSettings::default();
        assert!(settings.download_timeout > settings.request_timeout);
    }
}

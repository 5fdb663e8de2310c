//! HTTP transport: sends one request and classifies its response.

use crate::api_error::classify_failure;
use crate::codec::JsonCodec;
use crate::config::Config;
use crate::error::{ClientFailure, FailureKind};
use crate::Error;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

/// `Content-Type` of every request body.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// `Accept` header sent with every request.
pub const ACCEPT_VALUE: &str = "application/json, */*";

/// Statuses treated as success for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptedStatus {
    /// Exactly this status.
    Exactly(StatusCode),
    /// Any of these statuses.
    AnyOf(Vec<StatusCode>),
    /// Any 2xx status.
    AnySuccess,
}

impl Default for AcceptedStatus {
    fn default() -> Self {
        AcceptedStatus::Exactly(StatusCode::OK)
    }
}

impl From<StatusCode> for AcceptedStatus {
    fn from(status: StatusCode) -> Self {
        AcceptedStatus::Exactly(status)
    }
}

impl AcceptedStatus {
    pub fn accepts(&self, status: StatusCode) -> bool {
        match self {
            AcceptedStatus::Exactly(expected) => *expected == status,
            AcceptedStatus::AnyOf(expected) => expected.contains(&status),
            AcceptedStatus::AnySuccess => status.is_success(),
        }
    }
}

/// A single API call: method, path relative to the base URL, optional
/// JSON body and the statuses that count as success.
pub struct ApiRequest<'a, B: ?Sized = ()> {
    method: Method,
    path: &'a str,
    body: Option<&'a B>,
    accepted: AcceptedStatus,
}

impl<'a> ApiRequest<'a> {
    /// Create a request without a body, accepting `200 OK`.
    pub fn new(method: Method, path: &'a str) -> Self {
        Self {
            method,
            path,
            body: None,
            accepted: AcceptedStatus::default(),
        }
    }

    pub fn get(path: &'a str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &'a str) -> Self {
        Self::new(Method::POST, path)
    }
}

impl<'a, B: ?Sized> ApiRequest<'a, B> {
    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(self, body: &'a T) -> ApiRequest<'a, T> {
        ApiRequest {
            method: self.method,
            path: self.path,
            body: Some(body),
            accepted: self.accepted,
        }
    }

    /// Replace the accepted statuses.
    pub fn accept(mut self, accepted: impl Into<AcceptedStatus>) -> Self {
        self.accepted = accepted.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        self.path
    }
}

/// HTTP transport for the Netcraft API.
///
/// Holds one `reqwest::Client`, which pools connections and is safe to
/// share between any number of concurrent calls.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    codec: JsonCodec,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        let codec = JsonCodec::new().with_preview_limit(config.preview_limit());

        Ok(Self {
            client,
            base_url: config.base_url().clone(),
            codec,
        })
    }

    pub fn codec(&self) -> &JsonCodec {
        &self.codec
    }

    /// Resolve a path against the base URL.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::InvalidArgument(format!("invalid path {path:?}: {e}")))
    }

    /// Send a request.
    ///
    /// Returns the response when its status is accepted. Any other status
    /// becomes an [`Error::Failure`] built from the response body.
    pub async fn execute<B: Serialize + ?Sized>(
        &self,
        request: ApiRequest<'_, B>,
    ) -> Result<ApiResponse, Error> {
        let ApiRequest {
            method,
            path,
            body,
            accepted,
        } = request;

        let url = self.url(path)?;
        let mut builder = self.client.request(method.clone(), url);

        if let Some(body) = body {
            let payload = self.codec.encode(body)?;
            builder = builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(payload);
        }

        debug!(%method, path, has_body = body.is_some(), "sending request");

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%method, path, error = %e, "request failed");
                return Err(ClientFailure::transport(method, path, e).into());
            }
        };
        let status = response.status();

        if accepted.accepts(status) {
            debug!(%method, path, %status, "request succeeded");
            return Ok(ApiResponse {
                method,
                path: path.to_owned(),
                codec: self.codec,
                response,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(%method, path, %status, error = %e, "failed to read error body");
                return Err(ClientFailure::transport(method, path, e)
                    .with_status(status)
                    .into());
            }
        };

        let failure = classify_failure(
            &method,
            path,
            status,
            content_type.as_deref(),
            &text,
            &self.codec,
        );

        warn!(%method, path, %status, kind = ?failure.kind(), "request rejected");

        Err(failure.into())
    }
}

/// A response whose status was accepted.
#[derive(Debug)]
pub struct ApiResponse {
    method: Method,
    path: String,
    codec: JsonCodec,
    response: reqwest::Response,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Give up the typed wrapper and return the underlying response.
    pub fn into_inner(self) -> reqwest::Response {
        self.response
    }

    /// Decode the body as JSON.
    ///
    /// An empty body is a decode failure, never a default value.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, Error> {
        let ApiResponse {
            method,
            path,
            codec,
            response,
        } = self;

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                return Err(ClientFailure::transport(method, path, e)
                    .with_status(status)
                    .into())
            }
        };

        if body.is_empty() {
            return Err(ClientFailure::new(
                FailureKind::Decode,
                method.clone(),
                path.as_str(),
                format!("Response to {method} {path} is empty, can't parse as JSON"),
            )
            .with_status(status)
            .into());
        }

        codec.decode(&body).map_err(|e| {
            let text = String::from_utf8_lossy(&body);
            let message = format!(
                "Failed to parse response to {method} {path}: {e}\nPreview: {}",
                codec.preview(&text)
            );
            ClientFailure::new(FailureKind::Decode, method.clone(), path.as_str(), message)
                .with_status(status)
                .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetcraftBuilder;

    #[test]
    fn test_accepted_status() {
        assert!(AcceptedStatus::default().accepts(StatusCode::OK));
        assert!(!AcceptedStatus::default().accepts(StatusCode::CREATED));

        let any = AcceptedStatus::AnyOf(vec![StatusCode::OK, StatusCode::ACCEPTED]);
        assert!(any.accepts(StatusCode::ACCEPTED));
        assert!(!any.accepts(StatusCode::NO_CONTENT));

        assert!(AcceptedStatus::AnySuccess.accepts(StatusCode::NO_CONTENT));
        assert!(!AcceptedStatus::AnySuccess.accepts(StatusCode::FOUND));

        let created: AcceptedStatus = StatusCode::CREATED.into();
        assert!(created.accepts(StatusCode::CREATED));
    }

    #[test]
    fn test_url_construction() {
        let config = NetcraftBuilder::new()
            .base_url("https://example.com/api/v3")
            .build_config()
            .unwrap();

        let transport = HttpTransport::new(&config).unwrap();

        assert_eq!(
            transport.url("report/urls").unwrap().as_str(),
            "https://example.com/api/v3/report/urls"
        );
        assert_eq!(
            transport.url("/stats/leaderboard").unwrap().as_str(),
            "https://example.com/api/v3/stats/leaderboard"
        );
    }

    #[test]
    fn test_request_descriptor() {
        let body = serde_json::json!({"email": "a@example.com"});
        let request = ApiRequest::post("report/mistake")
            .json(&body)
            .accept(StatusCode::CREATED);

        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.path(), "report/mistake");
        assert!(request.body.is_some());
        assert_eq!(request.accepted, AcceptedStatus::Exactly(StatusCode::CREATED));
    }

    #[test]
    fn test_transport_uses_configured_preview_limit() {
        let config = NetcraftBuilder::new().preview_limit(10).build_config().unwrap();
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.codec().preview_limit(), 10);
    }
}

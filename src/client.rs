use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::models::Session;

const USER_AGENT_VALUE: &str = "api-contract-harness/0.1";

/// A file sent as the `file` field of a multipart upload.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<Value>,
    error: Option<String>,
}

/// A fully-read response. Non-2xx statuses are ordinary values here; callers
/// that need strict propagation use [`ApiResponse::ensure_success`].
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub text: String,
    pub json: Option<Value>,
}

impl ApiResponse {
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn status_in(&self, accepted: &[u16]) -> bool {
        accepted.contains(&self.status_code())
    }

    pub fn is_json_content(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|value| value.starts_with("application/json"))
            .unwrap_or(false)
    }

    pub fn json_body(&self, context: &str) -> HarnessResult<&Value> {
        self.json.as_ref().ok_or_else(|| {
            HarnessError::Assertion(format!(
                "{context}: response body is not JSON (status {}): {}",
                self.status_code(),
                self.text
            ))
        })
    }

    /// Turns a non-2xx response into [`HarnessError::Api`], keeping the
    /// server's message when the body carries one.
    pub fn ensure_success(self, context: &str) -> HarnessResult<Self> {
        if self.status.is_success() {
            return Ok(self);
        }

        let status = self.status_code();
        let message = self
            .json
            .clone()
            .and_then(|body| serde_json::from_value::<ApiErrorBody>(body).ok())
            .and_then(|body| match body.message {
                Some(Value::String(message)) if !message.is_empty() => Some(message),
                Some(Value::Array(messages)) if !messages.is_empty() => Some(
                    messages
                        .iter()
                        .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
                        .collect::<Vec<_>>()
                        .join("; "),
                ),
                _ => body.error.filter(|e| !e.is_empty()),
            });

        let message = match message {
            Some(message) => message,
            None if !self.text.is_empty() => format!("Response: {}", self.text),
            None => String::new(),
        };

        warn!(
            context = context,
            status = status,
            error_message = %message,
            "backend request failed"
        );

        Err(HarnessError::Api {
            context: context.to_string(),
            status,
            message,
        })
    }
}

/// HTTP adapter for the backend under test.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &HarnessConfig) -> HarnessResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins percent-encoded path segments onto the base URL.
    pub fn endpoint(&self, segments: &[&str]) -> HarnessResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                HarnessError::InvalidConfig(format!("base url `{}` cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get(&self, segments: &[&str], session: Option<&Session>) -> HarnessResult<ApiResponse> {
        let request = self.request(Method::GET, segments, session)?;
        self.send(request).await
    }

    pub async fn post_json(
        &self,
        segments: &[&str],
        body: &Value,
        session: Option<&Session>,
    ) -> HarnessResult<ApiResponse> {
        let request = self.request(Method::POST, segments, session)?.json(body);
        self.send(request).await
    }

    /// POST without a body, as used by the follow and like endpoints.
    pub async fn post_empty(&self, segments: &[&str], session: Option<&Session>) -> HarnessResult<ApiResponse> {
        let request = self.request(Method::POST, segments, session)?;
        self.send(request).await
    }

    pub async fn patch_json(
        &self,
        segments: &[&str],
        body: &Value,
        session: Option<&Session>,
    ) -> HarnessResult<ApiResponse> {
        let request = self.request(Method::PATCH, segments, session)?.json(body);
        self.send(request).await
    }

    pub async fn delete(&self, segments: &[&str], session: Option<&Session>) -> HarnessResult<ApiResponse> {
        let request = self.request(Method::DELETE, segments, session)?;
        self.send(request).await
    }

    pub async fn post_file(
        &self,
        segments: &[&str],
        file: FilePart,
        session: Option<&Session>,
    ) -> HarnessResult<ApiResponse> {
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(file.content_type)?;
        let form = Form::new().part("file", part);
        let request = self.request(Method::POST, segments, session)?.multipart(form);
        self.send(request).await
    }

    /// HEAD against an absolute URL returned by the backend, without auth.
    pub async fn head_absolute(&self, url: &str) -> HarnessResult<StatusCode> {
        let url = Url::parse(url)?;
        let response = self.http.head(url.clone()).send().await?;
        debug!(method = "HEAD", url = %url, status = response.status().as_u16(), "request completed");
        Ok(response.status())
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        session: Option<&Session>,
    ) -> HarnessResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        let builder = self.http.request(method, url);
        Ok(match session {
            Some(session) => builder.bearer_auth(&session.token),
            None => builder,
        })
    }

    async fn send(&self, request: RequestBuilder) -> HarnessResult<ApiResponse> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let text = response.text().await?;
        let json = serde_json::from_str::<Value>(&text).ok();

        debug!(url = %url, status = status.as_u16(), "request completed");

        Ok(ApiResponse {
            status,
            content_type,
            text,
            json,
        })
    }
}

//! Authenticated HTTP client.

use std::sync::Arc;

use bytes::Bytes;
use marketledger_auth::SessionProvider;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult, ErrorKind};
use crate::notify::{NotificationGate, Notifier};

/// A file part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name.
    pub field: String,
    /// File name sent to the server.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// Contents.
    pub data: Bytes,
}

/// Multipart form body, kept as plain data so it can be re-sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartBody {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
}

impl MultipartBody {
    /// Creates an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Appends a file part.
    #[must_use]
    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    /// Text fields in insertion order.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// File parts in insertion order.
    #[must_use]
    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    /// First value of the named text field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    fn to_form(&self) -> ApiResult<Form> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for file in &self.files {
            let part = Part::bytes(file.data.to_vec())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)
                .map_err(|e| {
                    ApiError::new(
                        ErrorKind::BadRequest,
                        None,
                        format!("Invalid content type for {}: {e}", file.file_name),
                    )
                })?;
            form = form.part(file.field.clone(), part);
        }
        Ok(form)
    }
}

/// Request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON document.
    Json(Value),
    /// Multipart form.
    Multipart(MultipartBody),
}

/// A successful response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status.
    pub status: u16,
    /// Raw body.
    pub body: Bytes,
}

impl ApiResponse {
    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an `Unknown` error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        let body: &[u8] = if self.body.is_empty() {
            b"null"
        } else {
            &self.body
        };
        serde_json::from_slice(body).map_err(|e| ApiError::decode(self.status, e))
    }
}

/// HTTP client that attaches the session's bearer token and recovers once
/// from an expired access token.
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    session: Arc<dyn SessionProvider>,
    gate: NotificationGate,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        config: ClientConfig,
        session: Arc<dyn SessionProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ApiError::new(ErrorKind::Unknown, None, e.to_string()))?;
        let gate = NotificationGate::new(notifier, config.notification_window);
        Ok(Self {
            http,
            config,
            session,
            gate,
        })
    }

    /// Client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolves a path relative to the API root.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not form a valid URL.
    pub fn url(&self, path: &str) -> ApiResult<Url> {
        self.config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::new(ErrorKind::BadRequest, None, format!("Invalid path {path}: {e}")))
    }

    /// Sends a request, refreshing the session and replaying once on 401.
    ///
    /// Failures are classified and forwarded to the notifier.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        query: &[(&str, String)],
    ) -> ApiResult<ApiResponse> {
        self.execute(method, path, &body, query)
            .await
            .map_err(|e| self.report(e))
    }

    /// Sends a request and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`], or `Unknown` if decoding fails.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let response = self.request(method, path, body, query).await?;
        response.json().map_err(|e| self.report(e))
    }

    fn report(&self, error: ApiError) -> ApiError {
        self.gate.report(&error);
        error
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: &RequestBody,
        query: &[(&str, String)],
    ) -> ApiResult<ApiResponse> {
        let url = self.url(path)?;
        let token = self.session.access_token();

        let response = self
            .send(method.clone(), &url, body, query, token.as_deref())
            .await?;
        if response.status != StatusCode::UNAUTHORIZED.as_u16() || token.is_none() {
            return classify(response);
        }

        debug!("{method} {path} returned 401, refreshing session");
        if let Err(e) = self.session.refresh(token.as_deref()).await {
            warn!("Session refresh failed: {e}");
            self.session.expire();
            return Err(ApiError::session_expired());
        }

        let token = self.session.access_token();
        let response = self.send(method, &url, body, query, token.as_deref()).await?;
        if response.status == StatusCode::UNAUTHORIZED.as_u16() {
            info!("Request still unauthorized after refresh, ending session");
            self.session.expire();
        }
        classify(response)
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        body: &RequestBody,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        let mut request = self.http.request(method, url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(value),
            RequestBody::Multipart(multipart) => request.multipart(multipart.to_form()?),
        };

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(ApiResponse { status, body })
    }
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_decode() {
        ApiError::new(ErrorKind::Unknown, error.status().map(|s| s.as_u16()), error.to_string())
    } else {
        ApiError::network(error)
    }
}

fn classify(response: ApiResponse) -> ApiResult<ApiResponse> {
    if (200..300).contains(&response.status) {
        Ok(response)
    } else {
        Err(ApiError::from_response(response.status, &response.body))
    }
}

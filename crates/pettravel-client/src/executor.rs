//! Authenticated Request Executor.
//!
//! Issues exactly one HTTP call with the current bearer token attached and
//! normalises whatever comes back into an [`HttpOutcome`]. HTTP-level failures
//! are data, not errors; only transport failures return `Err`.

use std::sync::Arc;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, NetworkErrorKind};
use crate::session::TokenStore;

/// A file attached to a multipart body.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub name: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Multipart form kept as plain data so a request can be re-sent on retry.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    fn to_form(&self) -> Form {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for file in &self.files {
            let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            let part = match part.mime_str(&file.content_type) {
                Ok(part) => part,
                Err(_) => {
                    tracing::debug!(content_type = %file.content_type, "Unrecognised content type, sending untyped part");
                    Part::bytes(file.bytes.clone()).file_name(file.file_name.clone())
                }
            };
            form = form.part(file.name.clone(), part);
        }
        form
    }
}

/// Request body.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Multipart(MultipartForm),
}

/// One logical API call, relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<RequestBody>,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    #[must_use]
    pub fn with_multipart(mut self, form: MultipartForm) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    #[must_use]
    pub fn with_query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }
}

/// Normalised result of one HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpOutcome {
    Success { status: u16, data: Value },
    Failure { status: u16, error_body: Value },
}

impl HttpOutcome {
    pub fn status(&self) -> u16 {
        match self {
            Self::Success { status, .. } | Self::Failure { status, .. } => *status,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Failure { status: 401, .. })
    }

    /// Converts a failure into the matching [`ApiError`].
    pub fn into_result(self) -> Result<Value, ApiError> {
        match self {
            Self::Success { data, .. } => Ok(data),
            Self::Failure { status, error_body } => Err(ApiError::from_failure(status, &error_body)),
        }
    }
}

/// Sends single requests with the session's bearer token.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    http: reqwest::Client,
    base_url: Url,
    store: Arc<TokenStore>,
}

impl RequestExecutor {
    pub fn new(config: &ClientConfig, store: Arc<TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            store,
        })
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Resolves an endpoint path against the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Network {
                kind: NetworkErrorKind::Other,
                message: format!("Invalid request path '{path}': {e}"),
            })
    }

    /// Sends `req` with the access token currently held by the store.
    pub async fn execute(&self, req: &ApiRequest) -> Result<HttpOutcome, ApiError> {
        let token = self.store.access_token();
        self.execute_with_token(req, token.as_deref()).await
    }

    /// Sends `req` with an explicit token (or none).
    pub async fn execute_with_token(
        &self,
        req: &ApiRequest,
        token: Option<&str>,
    ) -> Result<HttpOutcome, ApiError> {
        let url = self.url_for(&req.path)?;
        let mut builder = self
            .http
            .request(req.method.clone(), url)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        builder = match &req.body {
            Some(RequestBody::Json(body)) => builder.json(body),
            Some(RequestBody::Multipart(form)) => builder.multipart(form.to_form()),
            None => builder,
        };

        let resp = builder.send().await.map_err(|e| {
            tracing::warn!(method = %req.method, path = %req.path, error = %e, "Request failed before a response");
            ApiError::from(e)
        })?;

        let status = resp.status();
        let text = resp.text().await?;
        let body = parse_body(&text);

        tracing::debug!(
            method = %req.method,
            path = %req.path,
            status = status.as_u16(),
            authenticated = token.is_some(),
            "API request"
        );

        Ok(if status.is_success() {
            HttpOutcome::Success {
                status: status.as_u16(),
                data: body,
            }
        } else {
            HttpOutcome::Failure {
                status: status.as_u16(),
                error_body: body,
            }
        })
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

//! HTTP transport implementation using `reqwest`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_protocol::{
    FormValue, Headers, HttpRequest, HttpResponse, Method, RequestBody,
};

use crate::{Transport, TransportError};

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Base URL every request path is joined onto,
    /// e.g. `https://api.example.com/api`.
    pub base_url: String,

    /// Whole-request timeout. Default: 30 seconds.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Creates a config for `base_url` with default settings.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// A [`Transport`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Builds the underlying client.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidRequest`] if the base URL doesn't
    /// parse or the TLS backend can't be initialised.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidRequest(format!("base url: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        tracing::debug!(base_url = %config.base_url, "HTTP transport ready");
        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    /// Resolves a request path against the base URL. Absolute URLs are
    /// used as they are.
    pub fn url_for(&self, path: &str) -> Result<reqwest::Url, TransportError> {
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };
        reqwest::Url::parse(&raw)
            .map_err(|e| TransportError::InvalidRequest(format!("{raw}: {e}")))
    }

    fn build(&self, request: HttpRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let url = self.url_for(&request.path)?;
        let mut builder = self.client.request(to_reqwest_method(request.method), url);

        let multipart = request.body.is_multipart();
        let has_content_type = request.headers.contains("content-type");
        for (name, value) in request.headers.iter() {
            // The multipart encoder writes its own boundary header.
            if multipart && name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            builder = builder.header(name, value);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) if has_content_type => {
                let bytes = serde_json::to_vec(&value)
                    .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                builder.body(bytes)
            }
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(parts) => {
                let mut form = reqwest::multipart::Form::new();
                for part in parts {
                    form = match part.value {
                        FormValue::Text(text) => form.text(part.name, text),
                        FormValue::File {
                            file_name,
                            content_type,
                            bytes,
                        } => {
                            let mut file = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                            if let Some(mime) = content_type {
                                file = file
                                    .mime_str(&mime)
                                    .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                            }
                            form.part(part.name, file)
                        }
                    };
                }
                builder.multipart(form)
            }
        };

        Ok(builder)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = request.method;
        let path = request.path.clone();
        let builder = self.build(request)?;

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();

        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str(), value);
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Interrupted(e.to_string()))?;

        tracing::debug!(%method, %path, status, len = bytes.len(), "response received");

        Ok(HttpResponse {
            status,
            headers,
            body: parse_body(&bytes),
        })
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else if e.is_body() || e.is_decode() {
        TransportError::Interrupted(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}

/// JSON if it parses, otherwise the text as a JSON string; empty → `None`.
fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

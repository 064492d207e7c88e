//! Transport-neutral request and response types.
//!
//! These are the values the interceptor pipeline passes around. They
//! carry just enough HTTP to decide about credentials (path, headers,
//! body kind) and to classify failures (status, JSON body), without
//! tying any layer above the transport to a particular HTTP client.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// An ordered header list with case-insensitive names.
///
/// Header names are compared with `eq_ignore_ascii_case`, so
/// `Authorization` and `authorization` are the same header. Inserting
/// a header that already exists replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Creates an empty header list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any existing value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Returns the value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes `name`, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.0.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.0.remove(idx).1)
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RequestBody
// ---------------------------------------------------------------------------

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

/// The value of a multipart form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    /// A plain text field.
    Text(String),
    /// A file upload.
    File {
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

/// The body of an outgoing request.
///
/// The body kind matters to the request authenticator: JSON bodies get
/// an explicit `Content-Type: application/json`, multipart bodies don't
/// (the transport writes its own boundary header).
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

impl RequestBody {
    /// Returns `true` for form payloads whose content type the
    /// transport must choose.
    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

// ---------------------------------------------------------------------------
// HttpRequest
// ---------------------------------------------------------------------------

/// An outgoing request, relative to the API base URL.
///
/// `path` is the endpoint path (for example `"/api/login"` or
/// `"password/reset?lang=fr"`); the transport joins it onto its base URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub headers: Headers,
    pub body: RequestBody,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Headers::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attaches a JSON body built from any serializable value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if `body` can't be represented
    /// as JSON (e.g. a map with non-string keys).
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ProtocolError> {
        let value = serde_json::to_value(body).map_err(ProtocolError::Encode)?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Attaches a multipart form body.
    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// Sets a header, replacing any existing value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// The path without its query string or fragment.
    pub fn endpoint(&self) -> &str {
        let end = self.path.find(['?', '#']).unwrap_or(self.path.len());
        &self.path[..end]
    }
}

// ---------------------------------------------------------------------------
// HttpResponse
// ---------------------------------------------------------------------------

/// A response as seen by the interceptor pipeline.
///
/// `body` is `None` for empty bodies. Bodies that are not JSON are kept
/// as a JSON string so the text normalizer can still process them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Option<Value>,
}

impl HttpResponse {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body,
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Reads the `message` field of a JSON object body, or the body
    /// itself when it is a plain string.
    pub fn message(&self) -> Option<&str> {
        body_message(self.body.as_ref())
    }

    /// Deserializes the body into `T`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidPayload`] for an empty body and
    /// [`ProtocolError::Decode`] if the JSON doesn't match `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let body = self
            .body
            .clone()
            .ok_or_else(|| ProtocolError::InvalidPayload("empty response body".into()))?;
        serde_json::from_value(body).map_err(ProtocolError::Decode)
    }
}

/// Extracts a human-readable message from an error or success body.
pub fn body_message(body: Option<&Value>) -> Option<&str> {
    match body? {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("message").and_then(Value::as_str),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headers_insert_replaces_case_insensitively() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");
        headers.insert("content-type", "application/json");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn test_headers_remove_returns_value() {
        let mut headers = Headers::new();
        headers.insert("Authorization", "Bearer x");

        assert_eq!(headers.remove("authorization").as_deref(), Some("Bearer x"));
        assert!(headers.is_empty());
        assert_eq!(headers.remove("authorization"), None);
    }

    #[test]
    fn test_endpoint_strips_query_and_fragment() {
        assert_eq!(HttpRequest::get("/api/users?page=2").endpoint(), "/api/users");
        assert_eq!(HttpRequest::get("status#top").endpoint(), "status");
        assert_eq!(HttpRequest::get("/login").endpoint(), "/login");
    }

    #[test]
    fn test_json_body_sets_json_variant() {
        let req = HttpRequest::post("/login")
            .json(&json!({ "email": "a@b.c" }))
            .expect("plain object encodes");

        assert_eq!(req.body, RequestBody::Json(json!({ "email": "a@b.c" })));
        assert!(!req.body.is_multipart());
    }

    #[test]
    fn test_response_message_reads_object_or_string() {
        let obj = HttpResponse::new(400, Some(json!({ "message": "bad" })));
        let text = HttpResponse::new(500, Some(json!("boom")));
        let none = HttpResponse::new(204, None);

        assert_eq!(obj.message(), Some("bad"));
        assert_eq!(text.message(), Some("boom"));
        assert_eq!(none.message(), None);
    }

    #[test]
    fn test_response_json_empty_body_returns_invalid_payload() {
        let resp = HttpResponse::new(200, None);

        let result: Result<Value, _> = resp.json();

        assert!(matches!(result, Err(ProtocolError::InvalidPayload(_))));
    }

    #[test]
    fn test_method_display_is_uppercase() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(Method::default(), Method::Get);
    }
}

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::PteroError;
use crate::query::QueryOptions;

/// A decoded JSON object as returned by the panel
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

pub const RECEIVE_EVENT: &str = "receive";
pub const DEBUG_EVENT: &str = "debug";

/// HTTP verbs accepted by the panel API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = PteroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PATCH" => Ok(Method::Patch),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(PteroError::InvalidMethod(other.to_string())),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Request body sent with a call
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// Serialized to a JSON document
    Json(JsonObject),
    /// Sent verbatim
    Raw(Bytes),
    #[default]
    Empty,
}

impl Body {
    /// Build a JSON body from any serializable value that encodes to an object
    pub fn json<T: Serialize>(value: &T) -> Result<Self, PteroError> {
        match serde_json::to_value(value)? {
            serde_json::Value::Object(map) => Ok(Body::Json(map)),
            other => Err(PteroError::Validation(format!(
                "json body must be an object, got {other}"
            ))),
        }
    }

    pub fn raw(bytes: impl Into<Bytes>) -> Self {
        Body::Raw(bytes.into())
    }
}

/// Query options and body for a single call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    pub query: QueryOptions,
    pub body: Body,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: QueryOptions) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }
}

impl From<QueryOptions> for RequestParams {
    fn from(query: QueryOptions) -> Self {
        Self::new().with_query(query)
    }
}

impl From<Body> for RequestParams {
    fn from(body: Body) -> Self {
        Self::new().with_body(body)
    }
}

/// Lifecycle event emitted by the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A successful response payload
    Receive(JsonObject),
    /// A diagnostic trace message
    Debug(String),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Receive(_) => RECEIVE_EVENT,
            Event::Debug(_) => DEBUG_EVENT,
        }
    }
}

/// Who the dispatcher talks to and how it authenticates
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionIdentity {
    pub api_family: String,
    /// Base URL without a trailing slash
    pub domain: String,
    pub credential: String,
}

impl ConnectionIdentity {
    pub fn new(
        api_family: impl Into<String>,
        domain: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            api_family: api_family.into(),
            domain: domain.into(),
            credential: credential.into(),
        }
    }
}

impl fmt::Debug for ConnectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionIdentity")
            .field("api_family", &self.api_family)
            .field("domain", &self.domain)
            .field("credential", &"<redacted>")
            .finish()
    }
}

//! Backend access: every call goes through [`ApiClient`], which attaches the
//! bearer token and sorts responses into value, no value, or error.

mod scripted;
mod transport;

pub use scripted::ScriptedTransport;
pub use transport::{Method, PreparedRequest, RawResponse, ReqwestTransport, Transport};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{ApiError, ErrorBody};
use crate::notifier::ExpirySource;
use crate::session::SessionContext;

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    /// Already serialized by the caller; sent as-is.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
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

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.body = Some(Body::Json(value));
        Ok(self)
    }

    pub fn raw_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Body::Raw(body.into()));
        self
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// 204, or a zero or missing content length.
    Empty,
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn decode<R: DeserializeOwned>(self, path: &str) -> Result<Option<R>, ApiError> {
        let decoded = match self {
            Payload::Empty => return Ok(None),
            Payload::Json(value) => serde_json::from_value(value),
            Payload::Text(text) => serde_json::from_str(&text),
        };
        decoded.map(Some).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    base_url: String,
    session: SessionContext,
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(base_url: impl Into<String>, session: SessionContext, transport: T) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            session,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: Request) -> Result<Payload, ApiError> {
        let path = request.path.clone();
        let prepared = self.prepare(request)?;
        let response = self.transport.send(prepared).await?;
        debug!(status = response.status, "backend responded");
        self.classify(&path, response)
    }

    /// Sends and decodes; `None` when the backend returned no content.
    pub async fn fetch<R: DeserializeOwned>(&self, request: Request) -> Result<Option<R>, ApiError> {
        let path = request.path.clone();
        self.send(request).await?.decode(&path)
    }

    /// Sends and decodes, treating an empty response as an error.
    pub async fn expect<R: DeserializeOwned>(&self, request: Request) -> Result<R, ApiError> {
        let path = request.path.clone();
        self.fetch(request)
            .await?
            .ok_or(ApiError::MissingBody { path })
    }

    /// Sends and ignores whatever body comes back.
    pub async fn execute(&self, request: Request) -> Result<(), ApiError> {
        self.send(request).await.map(|_| ())
    }

    fn prepare(&self, request: Request) -> Result<PreparedRequest, ApiError> {
        let token = self.session.token();
        let headers = merge_headers(token.as_deref(), request.headers);
        let body = match request.body {
            None => None,
            Some(Body::Raw(raw)) => Some(raw),
            Some(Body::Json(value)) => Some(serde_json::to_string(&value).map_err(ApiError::Encode)?),
        };

        Ok(PreparedRequest {
            method: request.method,
            url: join_url(&self.base_url, &request.path),
            headers,
            body,
        })
    }

    fn classify(&self, path: &str, response: RawResponse) -> Result<Payload, ApiError> {
        if response.status == 401 {
            warn!(path, body = %response.body, "401 unauthorized");
            let fired = self.session.expire(ExpirySource::Unauthorized);
            debug!(fired, "session expiry signalled from 401");
            return Err(ApiError::SessionExpired);
        }

        if !response.is_success() {
            return Err(ApiError::Status {
                status: response.status,
                status_text: response.status_text,
                body: ErrorBody::parse(&response.body),
            });
        }

        if response.status == 204 || response.content_length().unwrap_or(0) == 0 {
            return Ok(Payload::Empty);
        }

        if response.is_json() {
            serde_json::from_str(&response.body)
                .map(Payload::Json)
                .map_err(|source| ApiError::Decode {
                    path: path.to_string(),
                    source,
                })
        } else {
            Ok(Payload::Text(response.body))
        }
    }
}

/// Defaults first, then the bearer token, then caller headers; later
/// entries replace earlier ones with the same (case-insensitive) name.
pub fn merge_headers(token: Option<&str>, caller: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
    if let Some(token) = token {
        headers.push(("Authorization".to_string(), format!("Bearer {token}")));
    }

    for (name, value) in caller {
        match headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => headers.push((name, value)),
        }
    }

    headers
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}/{path}")
    }
}

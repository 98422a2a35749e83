use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use events::{EventBus, Handler, HandlerResult};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use tracing::debug;

use crate::config::{ClientConfig, DEFAULT_USER_AGENT};
use crate::error::{PteroError, Result};
use crate::outcome::RequestOutcome;
use crate::query::build_query_string;
use crate::session::CallSession;
use crate::types::{
    Body, ConnectionIdentity, Event, JsonObject, Method, RequestParams, DEBUG_EVENT,
    RECEIVE_EVENT,
};

const JSON_CONTENT_TYPE: &str = "application/json";
const LATENCY_UNSET: f64 = -1.0;

/// Sends authenticated requests to one panel API family and reports each
/// call's lifecycle through `receive` and `debug` events.
///
/// Register observers with [`on_receive`](Self::on_receive) and
/// [`on_debug`](Self::on_debug) during setup, then share the dispatcher
/// (e.g. behind an `Arc`) for concurrent calls.
pub struct RequestDispatcher {
    identity: ConnectionIdentity,
    user_agent: String,
    timeout: Option<Duration>,
    suspended: AtomicBool,
    /// `f64` seconds stored as bits
    last_latency: AtomicU64,
    events: EventBus<Event>,
}

impl RequestDispatcher {
    pub fn new(
        api_family: impl Into<String>,
        domain: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self::with_identity(
            ConnectionIdentity::new(api_family, domain, credential),
            DEFAULT_USER_AGENT,
            None,
        )
    }

    pub fn from_config(config: ClientConfig) -> Self {
        let timeout = config.timeout();
        let identity = config.identity();
        Self::with_identity(identity, config.user_agent, timeout)
    }

    fn with_identity(
        identity: ConnectionIdentity,
        user_agent: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            identity,
            user_agent: user_agent.into(),
            timeout,
            suspended: AtomicBool::new(false),
            last_latency: AtomicU64::new(LATENCY_UNSET.to_bits()),
            events: EventBus::new(),
        }
    }

    pub fn identity(&self) -> &ConnectionIdentity {
        &self.identity
    }

    pub fn events(&self) -> &EventBus<Event> {
        &self.events
    }

    /// Replace the bearer token used by subsequent calls
    pub fn set_credential(&mut self, credential: impl Into<String>) {
        self.identity.credential = credential.into();
    }

    pub fn suspended(&self) -> bool {
        self.suspended.load(Ordering::Relaxed)
    }

    pub fn set_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::Relaxed);
    }

    /// Seconds between sending the last request and receiving its headers,
    /// or `-1.0` before any exchange completed
    pub fn last_latency_seconds(&self) -> f64 {
        f64::from_bits(self.last_latency.load(Ordering::Relaxed))
    }

    fn record_latency(&self, elapsed: Duration) {
        self.last_latency
            .store(elapsed.as_secs_f64().to_bits(), Ordering::Relaxed);
    }

    /// Subscribe to every successful response payload
    pub fn on_receive<F>(&mut self, callback: F) -> Handler<Event>
    where
        F: Fn(&JsonObject) -> HandlerResult + Send + Sync + 'static,
    {
        self.events.subscribe(RECEIVE_EVENT, move |event: &Event| match event {
            Event::Receive(payload) => callback(payload),
            Event::Debug(_) => Ok(()),
        })
    }

    /// Subscribe to diagnostic trace messages
    pub fn on_debug<F>(&mut self, callback: F) -> Handler<Event>
    where
        F: Fn(&str) -> HandlerResult + Send + Sync + 'static,
    {
        self.events.subscribe(DEBUG_EVENT, move |event: &Event| match event {
            Event::Debug(message) => callback(message),
            Event::Receive(_) => Ok(()),
        })
    }

    fn emit_debug(&self, message: impl AsRef<str>) {
        let event = Event::Debug(format!("[debug] {}", message.as_ref()));
        self.events.emit(DEBUG_EVENT, &event);
    }

    /// Headers sent with every request, rebuilt per call so a rotated
    /// credential takes effect immediately
    pub fn build_headers(&self) -> Result<HeaderMap> {
        if self.identity.api_family.is_empty() {
            return Err(PteroError::Config("api type is required for requests".into()));
        }
        if self.identity.credential.is_empty() {
            return Err(PteroError::Config(
                "missing authorization for requests".into(),
            ));
        }

        let user_agent = format!("{} {}", self.identity.api_family, self.user_agent);
        let mut authorization = header_value(&format!("Bearer {}", self.identity.credential))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&user_agent)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(AUTHORIZATION, authorization);
        Ok(headers)
    }

    /// Full request URL for `path` with the query suffix appended
    pub fn build_url(&self, path: &str, query: &str) -> String {
        format!(
            "{}/api/{}{}{}",
            self.identity.domain,
            self.identity.api_family.to_lowercase(),
            path,
            query
        )
    }

    /// Perform a request with a method given by name
    ///
    /// Unknown method names fail with [`PteroError::InvalidMethod`] before
    /// any network I/O.
    pub async fn perform(
        &self,
        path: &str,
        method: &str,
        params: impl Into<RequestParams>,
    ) -> Result<Option<JsonObject>> {
        let method: Method = method.parse()?;
        self.dispatch(path, method, params.into()).await
    }

    /// Send one request and classify its response
    ///
    /// Returns `Ok(None)` for 204, the decoded payload for 200/201,
    /// [`PteroError::Api`] for a 4xx error document and
    /// [`PteroError::Transport`] for anything else.
    pub async fn dispatch(
        &self,
        path: &str,
        method: Method,
        params: RequestParams,
    ) -> Result<Option<JsonObject>> {
        let body = match params.body {
            Body::Raw(bytes) => {
                self.emit_debug("sending raw byte payload");
                Some(bytes)
            }
            Body::Json(map) if !map.is_empty() => {
                self.emit_debug("sending json payload");
                Some(Bytes::from(serde_json::to_vec(&map)?))
            }
            Body::Json(_) | Body::Empty => None,
        };

        let query = build_query_string(&params.query)?;
        let headers = self.build_headers()?;
        let url = self.build_url(path, &query);

        self.emit_debug("attempting to start session");
        let session = CallSession::open(self.timeout)?;

        self.emit_debug(format!("attempting to perform request to {}", url));
        debug!(method = %method, url = %url, "Dispatching request");

        let mut request = session
            .client()
            .request(method.into(), &url)
            .headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let start = Instant::now();
        let response = request.send().await?;
        let elapsed = start.elapsed();
        self.record_latency(elapsed);

        let status = response.status().as_u16();
        let raw = if RequestOutcome::expects_body(status) {
            response.bytes().await?
        } else {
            Bytes::new()
        };

        self.emit_debug("ensuring session close before continuing");
        session.close();
        self.emit_debug(format!("received status: {}", status));
        debug!(
            status,
            latency_ms = elapsed.as_millis() as u64,
            "Received response"
        );

        let outcome = RequestOutcome::classify(status, &raw);
        if let RequestOutcome::Data(data) = &outcome {
            self.events.emit(RECEIVE_EVENT, &Event::Receive(data.clone()));
        }
        outcome.into_result()
    }

    pub async fn get(
        &self,
        path: &str,
        params: impl Into<RequestParams>,
    ) -> Result<Option<JsonObject>> {
        self.dispatch(path, Method::Get, params.into()).await
    }

    pub async fn post(
        &self,
        path: &str,
        params: impl Into<RequestParams>,
    ) -> Result<Option<JsonObject>> {
        self.dispatch(path, Method::Post, params.into()).await
    }

    pub async fn patch(
        &self,
        path: &str,
        params: impl Into<RequestParams>,
    ) -> Result<Option<JsonObject>> {
        self.dispatch(path, Method::Patch, params.into()).await
    }

    pub async fn put(
        &self,
        path: &str,
        params: impl Into<RequestParams>,
    ) -> Result<Option<JsonObject>> {
        self.dispatch(path, Method::Put, params.into()).await
    }

    pub async fn delete(&self, path: &str) -> Result<Option<JsonObject>> {
        self.dispatch(path, Method::Delete, RequestParams::default())
            .await
    }
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("identity", &self.identity)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("suspended", &self.suspended())
            .field("last_latency_seconds", &self.last_latency_seconds())
            .field("events", &self.events)
            .finish()
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| PteroError::Config(format!("invalid header value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn dispatcher() -> RequestDispatcher {
        RequestDispatcher::new("Application", "https://panel.test", "ptla_token")
    }

    #[test]
    fn test_build_headers() {
        let headers = dispatcher().build_headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer ptla_token");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[ACCEPT], "application/json");

        let user_agent = headers[USER_AGENT].to_str().unwrap();
        assert_eq!(user_agent, format!("Application {}", DEFAULT_USER_AGENT));
    }

    #[test]
    fn test_build_headers_requires_identity() {
        let err = RequestDispatcher::new("", "https://panel.test", "token")
            .build_headers()
            .unwrap_err();
        assert!(matches!(err, PteroError::Config(_)));

        let err = RequestDispatcher::new("Client", "https://panel.test", "")
            .build_headers()
            .unwrap_err();
        assert!(matches!(err, PteroError::Config(_)));
    }

    #[test]
    fn test_build_headers_uses_configured_user_agent() {
        let config = ClientConfig::new("Client", "https://panel.test", "ptlc")
            .with_user_agent("my-panel-tool v2.0.0");
        let headers = RequestDispatcher::from_config(config).build_headers().unwrap();
        assert_eq!(headers[USER_AGENT], "Client my-panel-tool v2.0.0");
    }

    #[test]
    fn test_credential_rotation() {
        let mut dispatcher = dispatcher();
        dispatcher.set_credential("ptla_rotated");
        let headers = dispatcher.build_headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer ptla_rotated");
    }

    #[test]
    fn test_build_url_lowercases_family() {
        let url = dispatcher().build_url("/servers", "?page=2");
        assert_eq!(url, "https://panel.test/api/application/servers?page=2");
    }

    #[test]
    fn test_initial_state() {
        let dispatcher = dispatcher();
        assert_eq!(dispatcher.last_latency_seconds(), -1.0);
        assert!(!dispatcher.suspended());

        dispatcher.set_suspended(true);
        assert!(dispatcher.suspended());
    }

    #[test]
    fn test_debug_output_hides_credential() {
        let printed = format!("{:?}", dispatcher());
        assert!(!printed.contains("ptla_token"));
    }

    #[tokio::test]
    async fn test_invalid_method_fails_before_io() {
        let mut dispatcher = dispatcher();
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        dispatcher.on_debug(move |msg| {
            sink.lock().unwrap().push(msg.to_string());
            Ok(())
        });

        let err = dispatcher
            .perform("/servers", "TRACE", RequestParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PteroError::InvalidMethod(m) if m == "TRACE"));
        assert!(messages.lock().unwrap().is_empty());
        assert_eq!(dispatcher.last_latency_seconds(), -1.0);
    }

    #[tokio::test]
    async fn test_validation_fails_before_io() {
        let mut dispatcher = dispatcher();
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        dispatcher.on_debug(move |msg| {
            sink.lock().unwrap().push(msg.to_string());
            Ok(())
        });

        let err = dispatcher
            .get("/servers", crate::QueryOptions::new().page(51))
            .await
            .unwrap_err();
        assert!(matches!(err, PteroError::Validation(_)));
        assert!(!messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.contains("start session")));
    }

    #[test]
    fn test_on_receive_filters_by_event() {
        let mut dispatcher = dispatcher();
        let received = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&received);
        let handler = dispatcher.on_receive(move |_| {
            *counter.lock().unwrap() += 1;
            Ok(())
        });

        handler(&Event::Debug("noise".into())).unwrap();
        handler(&Event::Receive(JsonObject::new())).unwrap();
        assert_eq!(*received.lock().unwrap(), 1);
        assert_eq!(dispatcher.events().subscriber_count(RECEIVE_EVENT), 1);
    }
}

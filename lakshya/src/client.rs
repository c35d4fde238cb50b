use crate::api::auth::{RefreshRequest, TokenResponse};
use crate::config::{normalize_base_url, ClientConfig};
use crate::error::ApiError;
use crate::session::SessionStore;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use log::{debug, info, warn};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
pub use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub(crate) const REFRESH_ENDPOINT: &str = "/auth/refresh";
const GENERIC_FAILURE: &str = "Request failed";

/// Invoked once each time the pipeline gives up on the session (refresh impossible or
/// failed) and has cleared it. Presentation code uses this to send the user back to login.
pub type OnUnauthenticated = Arc<dyn Fn() + Send + Sync>;

/// How a request relates to the stored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Bearer token injected; a 401 triggers one refresh-and-retry cycle.
    Refreshable,
    /// Bearer token injected, but a 401 ends the session without attempting a refresh. For
    /// the authentication endpoints that need a session themselves.
    BearerOnly,
    /// No bearer token and no refresh: login, registration, and the refresh call.
    Anonymous,
}

impl AuthMode {
    fn sends_token(self) -> bool {
        !matches!(self, AuthMode::Anonymous)
    }
}

/// One outbound API call. Built once, never mutated by the pipeline.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    endpoint: String,
    body: Option<Value>,
    headers: HeaderMap,
    auth_mode: AuthMode,
    fallback_message: &'static str,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        ApiRequest {
            method,
            endpoint: endpoint.into(),
            body: None,
            headers: HeaderMap::new(),
            auth_mode: AuthMode::Refreshable,
            fallback_message: GENERIC_FAILURE,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        ApiRequest::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        ApiRequest::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        ApiRequest::new(Method::PUT, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        ApiRequest::new(Method::DELETE, endpoint)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("unserializable body: {e}")))?;
        self.body = Some(body);
        Ok(self)
    }

    /// Extra header; overrides a default of the same name but leaves the others in place.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, ApiError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ApiError::InvalidRequest(format!("invalid header name: {name}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ApiError::InvalidRequest(format!("invalid value for header {name}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }

    /// Message used when a failed response carries no readable `detail`.
    pub fn fallback_message(mut self, message: &'static str) -> Self {
        self.fallback_message = message;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn get_auth_mode(&self) -> AuthMode {
        self.auth_mode
    }
}

/// Error payload the backend sends with non-2xx responses.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    detail: Value,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        match self.detail {
            Value::String(s) => Some(s),
            // validation failures: [{"loc": [...], "msg": "...", "type": "..."}, ...]
            Value::Array(items) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item["msg"].as_str())
                    .collect();
                if msgs.is_empty() {
                    None
                } else {
                    Some(msgs.join("; "))
                }
            }
            _ => None,
        }
    }
}

/// Authenticated client for the backend API.
///
/// Injects the stored bearer token into each request, transparently refreshes it once when
/// the server answers 401, and clears the session when that is impossible.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    session: SessionStore,
    refresh_lock: tokio::sync::Mutex<()>,
    on_unauthenticated: Option<OnUnauthenticated>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .field("on_unauthenticated", &self.on_unauthenticated.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(&config.user_agent, config.timeout)?;
        Ok(ApiClient::with_transport(
            &config.base_url,
            Arc::new(transport),
            session,
        ))
    }

    pub fn with_transport(
        base_url: &str,
        transport: Arc<dyn Transport>,
        session: SessionStore,
    ) -> Self {
        ApiClient {
            transport,
            base_url: normalize_base_url(base_url),
            session,
            refresh_lock: tokio::sync::Mutex::new(()),
            on_unauthenticated: None,
        }
    }

    pub fn on_unauthenticated(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthenticated = Some(Arc::new(f));
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Executes one logical API call.
    ///
    /// Returns `None` for an empty (eg, 204) response, otherwise the parsed JSON body.
    pub async fn send(&self, req: &ApiRequest) -> Result<Option<Value>, ApiError> {
        let token = if req.auth_mode.sends_token() {
            self.session.access_token()
        } else {
            None
        };
        let resp = self.dispatch(req, token.as_deref()).await?;
        if resp.status == 401 {
            match req.auth_mode {
                AuthMode::Refreshable => return self.recover_unauthorized(req, token).await,
                AuthMode::BearerOnly => {
                    info!("{} {} rejected the session", req.method, req.endpoint);
                    self.end_session();
                    return Err(ApiError::Unauthorized);
                }
                AuthMode::Anonymous => {}
            }
        }
        parse_response(resp, req.fallback_message)
    }

    /// Like `send`, decoding the result into a record. An empty response decodes from `{}`.
    pub async fn request<T: DeserializeOwned>(&self, req: &ApiRequest) -> Result<T, ApiError> {
        let value = self
            .send(req)
            .await?
            .unwrap_or_else(|| Value::Object(Default::default()));
        Ok(serde_json::from_value(value)?)
    }

    /// Forgets the local session without contacting the server.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session.clear_session()?;
        info!("logged out");
        Ok(())
    }

    fn build_headers(&self, req: &ApiRequest, token: Option<&str>) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(token) = token {
            headers.insert(header::AUTHORIZATION, bearer_value(token)?);
        }
        for (name, value) in req.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        Ok(headers)
    }

    async fn dispatch(
        &self,
        req: &ApiRequest,
        token: Option<&str>,
    ) -> Result<HttpResponse, ApiError> {
        let headers = self.build_headers(req, token)?;
        self.dispatch_with_headers(req, headers).await
    }

    async fn dispatch_with_headers(
        &self,
        req: &ApiRequest,
        headers: HeaderMap,
    ) -> Result<HttpResponse, ApiError> {
        debug!(
            "API {} endpoint={} auth={:?}",
            req.method, req.endpoint, req.auth_mode
        );
        let body = match &req.body {
            Some(b) => Some(serde_json::to_vec(b)?),
            None => None,
        };
        let resp = self
            .transport
            .send(HttpRequest {
                method: req.method.clone(),
                url: format!("{}{}", self.base_url, req.endpoint),
                headers,
                body,
            })
            .await?;
        debug!("API {} endpoint={} status={}", req.method, req.endpoint, resp.status);
        Ok(resp)
    }

    /// 401 handling: refresh once, retry once, otherwise end the session.
    async fn recover_unauthorized(
        &self,
        req: &ApiRequest,
        stale_token: Option<String>,
    ) -> Result<Option<Value>, ApiError> {
        if let Some(token) = self.refresh_after(stale_token.as_deref()).await {
            // the fresh token wins over any caller-supplied Authorization header
            let mut headers = self.build_headers(req, Some(&token))?;
            headers.insert(header::AUTHORIZATION, bearer_value(&token)?);
            match self.dispatch_with_headers(req, headers).await {
                Ok(resp) if resp.is_success() => return parse_response(resp, req.fallback_message),
                Ok(resp) => warn!(
                    "retry of {} {} after refresh failed with status {}",
                    req.method, req.endpoint, resp.status
                ),
                Err(e) => warn!(
                    "retry of {} {} after refresh failed: {}",
                    req.method, req.endpoint, e
                ),
            }
        }
        self.end_session();
        Err(ApiError::Unauthorized)
    }

    /// Obtains an access token newer than `stale_token`, refreshing if nobody else has.
    ///
    /// Concurrent callers queue on `refresh_lock`; whoever gets it second finds the token
    /// already replaced and reuses it instead of spending the refresh token again.
    pub(crate) async fn refresh_after(&self, stale_token: Option<&str>) -> Option<String> {
        let _guard = self.refresh_lock.lock().await;
        if let Some(current) = self.session.access_token() {
            if stale_token != Some(current.as_str()) {
                debug!("access token already refreshed by a concurrent request");
                return Some(current);
            }
        }
        let refresh_token = match self.session.refresh_token() {
            Some(t) => t,
            None => {
                info!("access token rejected and no refresh token stored");
                return None;
            }
        };
        match self.refresh_with(refresh_token).await {
            Ok(tokens) => Some(tokens.access_token),
            Err(e) => {
                warn!("session refresh failed: {}", e);
                None
            }
        }
    }

    async fn refresh_with(&self, refresh_token: String) -> Result<TokenResponse, ApiError> {
        info!("refreshing session");
        let req = ApiRequest::post(REFRESH_ENDPOINT)
            .json(&RefreshRequest { refresh_token })?
            .auth_mode(AuthMode::Anonymous);
        let resp = self.dispatch(&req, None).await?;
        if !resp.is_success() {
            return Err(failure_from(&resp, req.fallback_message));
        }
        let tokens: TokenResponse = serde_json::from_slice(&resp.body)?;
        self.session
            .set_session(&tokens.access_token, &tokens.refresh_token, &tokens.user)?;
        Ok(tokens)
    }

    /// Terminal failure: clear everything and tell whoever is listening.
    pub(crate) fn end_session(&self) {
        warn!("session is no longer valid, clearing it");
        if let Err(e) = self.session.clear_session() {
            warn!("could not clear session: {}", e);
        }
        if let Some(cb) = &self.on_unauthenticated {
            cb();
        }
    }
}

fn bearer_value(token: &str) -> Result<HeaderValue, ApiError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| ApiError::InvalidRequest("access token is not a valid header".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

fn failure_from(resp: &HttpResponse, fallback: &str) -> ApiError {
    let message = serde_json::from_slice::<ErrorBody>(&resp.body)
        .ok()
        .and_then(ErrorBody::message)
        .unwrap_or_else(|| fallback.to_string());
    ApiError::Request {
        status: resp.status,
        message,
    }
}

fn parse_response(resp: HttpResponse, fallback: &str) -> Result<Option<Value>, ApiError> {
    if !resp.is_success() {
        return Err(failure_from(&resp, fallback));
    }
    if resp.status == 204 || resp.body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&resp.body)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_string() {
        let resp = HttpResponse::new(400, r#"{"detail": "Email already registered"}"#);
        let err = failure_from(&resp, "Registration failed");
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("Email already registered"));
    }

    #[test]
    fn test_error_detail_validation_list() {
        let resp = HttpResponse::new(
            422,
            r#"{"detail": [{"loc": ["body", "email"], "msg": "value is not a valid email address", "type": "value_error"}]}"#,
        );
        match failure_from(&resp, GENERIC_FAILURE) {
            ApiError::Request { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "value is not a valid email address");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_body_unparseable() {
        let resp = HttpResponse::new(502, "<html>Bad Gateway</html>");
        match failure_from(&resp, GENERIC_FAILURE) {
            ApiError::Request { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Request failed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let resp = HttpResponse::new(500, r#"{"error": "boom"}"#);
        assert!(failure_from(&resp, "Login failed")
            .to_string()
            .ends_with("Login failed"));
    }

    #[test]
    fn test_parse_empty_response() {
        // 204 never touches the body
        assert_eq!(
            parse_response(HttpResponse::new(204, "not json"), GENERIC_FAILURE).unwrap(),
            None
        );
        assert_eq!(
            parse_response(HttpResponse::new(200, ""), GENERIC_FAILURE).unwrap(),
            None
        );
        assert_eq!(
            parse_response(HttpResponse::new(200, r#"{"a": 1}"#), GENERIC_FAILURE).unwrap(),
            Some(serde_json::json!({"a": 1}))
        );
        assert!(matches!(
            parse_response(HttpResponse::new(200, "{"), GENERIC_FAILURE),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn test_request_builder() {
        let req = ApiRequest::put("/users/skills/3")
            .json(&serde_json::json!({"proficiency": 80}))
            .unwrap()
            .header("X-Trace", "abc")
            .unwrap()
            .auth_mode(AuthMode::BearerOnly);
        assert_eq!(req.method(), &Method::PUT);
        assert_eq!(req.endpoint(), "/users/skills/3");
        assert_eq!(req.body().unwrap()["proficiency"], 80);
        assert_eq!(req.headers()["x-trace"], "abc");
        assert_eq!(req.get_auth_mode(), AuthMode::BearerOnly);
        assert!(ApiRequest::get("/x").header("bad header", "v").is_err());
    }
}

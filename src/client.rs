use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, header};
use serde::Deserialize;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, CLIENT_THREADS_CREATED,
    STREAM_BYTES, STREAM_CONTENT_FRAMES, STREAM_IGNORED_FRAMES, STREAM_METADATA_ERRORS,
    STREAM_METADATA_FRAMES,
};
use crate::stream::{DecodedMessage, FrameDecoder};
use crate::types::{
    ChatRequest, CreateThreadRequest, LoginRequest, LoginResponse, Thread, ThreadResponse,
};

/// Default base URL of the assistant API.
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api/";
/// Environment variable consulted when no API key is given.
pub const API_KEY_ENV: &str = "INTERPRETALEX_API_KEY";
/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// The assistant operations a conversation needs.
///
/// [`InterpretaLex`] is the HTTP implementation; tests and embedders can provide their
/// own.
#[async_trait::async_trait]
pub trait AssistantTransport: Send + Sync {
    /// Creates a new conversation thread.
    async fn create_thread(&self) -> Result<Thread>;

    /// Sends `message` on `thread_id` and decodes the streamed reply.
    async fn send_chat(&self, thread_id: &str, message: &str) -> Result<DecodedMessage>;
}

/// The email/password authentication operations.
#[async_trait::async_trait]
pub trait AuthTransport: Send + Sync {
    /// Exchanges credentials for a token and user record.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse>;

    /// Invalidates `token` on the server.
    async fn logout(&self, token: &str) -> Result<()>;
}

/// Client for the InterpretaLex assistant API.
#[derive(Clone)]
pub struct InterpretaLex {
    api_key: HeaderValue,
    client: ReqwestClient,
    base_url: Url,
    auth_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl std::fmt::Debug for InterpretaLex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpretaLex")
            .field("base_url", &self.base_url.as_str())
            .field("auth_url", &self.auth_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

impl InterpretaLex {
    /// Create a new client against the default API URL.
    ///
    /// The API key can be provided directly or read from the `INTERPRETALEX_API_KEY`
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `auth_url` defaults to `base_url`.  Both URLs are treated as directories: a
    /// missing trailing slash is added.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        auth_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV).map_err(|_| {
                Error::authentication(format!(
                    "API key not provided and {API_KEY_ENV} environment variable not set"
                ))
            })?,
        };
        let api_key = HeaderValue::from_str(&api_key).map_err(|_| {
            Error::validation(
                "API key contains characters not allowed in a header",
                Some("api_key".to_string()),
            )
        })?;

        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let auth_url = match auth_url {
            Some(url) => parse_base_url(&url)?,
            None => base_url.clone(),
        };

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            auth_url,
            timeout,
            logger: None,
        })
    }

    /// Attaches a logger that observes every request.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The base URL of the assistant API.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The base URL of the auth endpoints.
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// The request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert("x-api-key", self.api_key.clone());
        headers
    }

    fn endpoint(base: &Url, path: &str) -> Result<Url> {
        Ok(base.join(path)?)
    }

    /// Sends a request, mapping transport failures and non-success statuses to errors.
    async fn execute(&self, endpoint: &str, request: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = match request.send().await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(Self::process_error_response(response).await),
            Err(e) => Err(self.map_send_error(e)),
        };
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            CLIENT_REQUEST_ERRORS.click();
            if let Some(logger) = &self.logger {
                logger.log_request_error(endpoint, err);
            }
        }
        result
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<String>,
            message: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let error_message = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|parsed| parsed.error.or(parsed.message))
            .unwrap_or(error_body);

        error_for_status(status_code, error_message)
    }

    /// Creates a new thread and returns the full server envelope.
    pub async fn create_thread_response(&self) -> Result<ThreadResponse> {
        let url = Self::endpoint(&self.base_url, "assistant/threads")?;
        let request = self
            .client
            .post(url)
            .headers(self.default_headers())
            .json(&CreateThreadRequest::default());
        let response = self.execute("assistant/threads", request).await?;
        let envelope = response.json::<ThreadResponse>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse thread response: {e}"),
                Some(Box::new(e)),
            )
        })?;
        if let Some(logger) = &self.logger {
            logger.log_thread_response(&envelope);
        }
        Ok(envelope)
    }

    async fn post_chat(&self, request: &ChatRequest) -> Result<Response> {
        let url = Self::endpoint(&self.base_url, "assistant/chat")?;
        let builder = self
            .client
            .post(url)
            .headers(self.default_headers())
            .json(request);
        self.execute("assistant/chat", builder).await
    }

    fn stream_error(&self, e: reqwest::Error) -> Error {
        CLIENT_REQUEST_ERRORS.click();
        if e.is_timeout() {
            Error::timeout(
                format!("Timed out reading chat response: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else {
            Error::connection(format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
        }
    }
}

#[async_trait::async_trait]
impl AssistantTransport for InterpretaLex {
    async fn create_thread(&self) -> Result<Thread> {
        let thread = self.create_thread_response().await?.into_thread()?;
        CLIENT_THREADS_CREATED.click();
        Ok(thread)
    }

    /// Streams the response body through a [`FrameDecoder`] as it arrives.
    async fn send_chat(&self, thread_id: &str, message: &str) -> Result<DecodedMessage> {
        let request = ChatRequest::new(thread_id, message);
        let response = self.post_chat(&request).await?;
        let mut decoder = FrameDecoder::new();
        let mut raw = self.logger.as_ref().map(|_| Vec::new());
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.stream_error(e))?;
            STREAM_BYTES.count(chunk.len() as u64);
            if let Some(raw) = raw.as_mut() {
                raw.extend_from_slice(&chunk);
            }
            decoder.push(&chunk);
        }
        let decoded = decoder.finish();

        STREAM_CONTENT_FRAMES.count(decoded.stats.content as u64);
        STREAM_METADATA_FRAMES.count(decoded.stats.metadata as u64);
        STREAM_IGNORED_FRAMES.count(decoded.stats.ignored as u64);
        STREAM_METADATA_ERRORS.count(decoded.metadata_errors.len() as u64);
        if let Some(logger) = &self.logger {
            if let Some(raw) = raw {
                logger.log_chat_body(&request, &String::from_utf8_lossy(&raw));
            }
            logger.log_decoded_message(&request, &decoded);
            for error in &decoded.metadata_errors {
                logger.log_metadata_error(error);
            }
        }
        Ok(decoded)
    }
}

#[async_trait::async_trait]
impl AuthTransport for InterpretaLex {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let url = Self::endpoint(&self.auth_url, "auth/login")?;
        let request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            });
        let response = self.execute("auth/login", request).await?;
        response.json::<LoginResponse>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse login response: {e}"),
                Some(Box::new(e)),
            )
        })
    }

    async fn logout(&self, token: &str) -> Result<()> {
        let url = Self::endpoint(&self.auth_url, "auth/logout")?;
        let request = self.client.post(url).bearer_auth(token);
        self.execute("auth/logout", request).await?;
        Ok(())
    }
}

/// Map an HTTP status code and message to the matching error variant.
pub(crate) fn error_for_status(status_code: u16, message: String) -> Error {
    match status_code {
        400 => Error::bad_request(message),
        401 | 403 => Error::authentication(message),
        404 => Error::not_found(message),
        408 => Error::timeout(message, None),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message),
        _ => Error::api(status_code, message),
    }
}

/// Parses a base URL, adding the trailing slash `Url::join` needs to keep the last
/// path segment.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::validation(
            format!("{raw} cannot be used as a base URL"),
            Some("base_url".to_string()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = InterpretaLex::new(Some("test-key".to_string())).unwrap();
        assert_eq!(client.api_key, HeaderValue::from_static("test-key"));
        assert_eq!(client.base_url.as_str(), DEFAULT_API_URL);
        assert_eq!(client.auth_url.as_str(), DEFAULT_API_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);

        let client = InterpretaLex::with_options(
            Some("test-key".to_string()),
            Some("https://lex.example.pe/api".to_string()),
            Some("https://auth.example.pe/".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url().as_str(), "https://lex.example.pe/api/");
        assert_eq!(client.auth_url().as_str(), "https://auth.example.pe/");
        assert_eq!(client.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn endpoints_keep_base_path() {
        let client = InterpretaLex::with_options(
            Some("k".to_string()),
            Some("https://lex.example.pe/api".to_string()),
            None,
            None,
        )
        .unwrap();
        let url = InterpretaLex::endpoint(client.base_url(), "assistant/chat").unwrap();
        assert_eq!(url.as_str(), "https://lex.example.pe/api/assistant/chat");
        let url = InterpretaLex::endpoint(client.auth_url(), "auth/login").unwrap();
        assert_eq!(url.as_str(), "https://lex.example.pe/api/auth/login");
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let err = InterpretaLex::with_options(
            Some("k".to_string()),
            Some("not a url".to_string()),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));

        let err = InterpretaLex::with_options(
            Some("k".to_string()),
            Some("mailto:lex@example.pe".to_string()),
            None,
            None,
        )
        .unwrap_err();
        assert!(err.is_validation());

        let err = InterpretaLex::new(Some("bad\nkey".to_string())).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn default_headers_carry_api_key() {
        let client = InterpretaLex::new(Some("secret".to_string())).unwrap();
        let headers = client.default_headers();
        assert_eq!(headers.get("x-api-key").unwrap(), "secret");
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            error_for_status(400, "x".into()),
            Error::BadRequest { .. }
        ));
        assert!(error_for_status(401, "x".into()).is_authentication());
        assert!(error_for_status(403, "x".into()).is_authentication());
        assert!(matches!(
            error_for_status(404, "x".into()),
            Error::NotFound { .. }
        ));
        assert!(error_for_status(408, "x".into()).is_timeout());
        assert!(error_for_status(503, "x".into()).is_server_error());
        assert_eq!(error_for_status(422, "x".into()).status_code(), Some(422));
    }

    #[tokio::test]
    async fn test_live_round_trip() {
        // Requires a running assistant backend and INTERPRETALEX_API_KEY.
        let Ok(api_key) = env::var(API_KEY_ENV) else {
            println!("Skipping test_live_round_trip: {API_KEY_ENV} not set");
            return;
        };
        let base_url = env::var("INTERPRETALEX_API_URL").ok();
        let client = InterpretaLex::with_options(Some(api_key), base_url, None, None).unwrap();
        let thread = client.create_thread().await.unwrap();
        let decoded = client
            .send_chat(&thread.id, "¿Qué es una licitación pública?")
            .await
            .unwrap();
        assert!(!decoded.is_empty());
    }
}

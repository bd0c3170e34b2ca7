use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::storage::{keys, Mirror};

const SESSION_EVENT_CAPACITY: usize = 16;

/// Raw body of a streaming response, chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = AppResult<Vec<u8>>> + Send>>;

/// Application-wide notifications emitted by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A request was rejected with 401. The stored credential and profile
    /// have already been removed; the shell decides where to navigate.
    Unauthorized,
}

/// The single configured request pipeline every API module goes through.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    stream_client: reqwest::Client,
    base_url: String,
    development: bool,
    mirror: Mirror,
    events: broadcast::Sender<SessionEvent>,
}

impl HttpClient {
    pub fn new(config: &AppConfig, mirror: Mirror) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;
        // Streaming replies can legitimately outlive the request timeout.
        let stream_client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build streaming client: {e}")))?;
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);

        Ok(Self {
            client,
            stream_client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            development: config.is_development(),
            mirror,
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Credential currently held in durable storage, read fresh per request.
    pub fn token(&self) -> Option<String> {
        self.mirror.load_raw(keys::ACCESS_TOKEN).filter(|t| !t.is_empty())
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.send(Method::GET, path, |b| b).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> AppResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(Method::GET, path, |b| b.query(query)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> AppResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, path, |b| b.json(body)).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.send(Method::POST, path, |b| b).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> AppResult<T> {
        self.send(Method::POST, path, |b| b.multipart(form)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> AppResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::PUT, path, |b| b.json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.send(Method::DELETE, path, |b| b).await
    }

    pub async fn delete_with_body<T, B>(&self, path: &str, body: &B) -> AppResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::DELETE, path, |b| b.json(body)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> AppResult<T> {
        let url = self.url(path);
        let request = build(self.authorize(self.client.request(method.clone(), &url)));

        if self.development {
            debug!(%method, %url, "Sending API request");
        }

        let response = request.send().await.map_err(|e| {
            if self.development {
                error!(%method, %url, "API request failed without response: {e}");
            }
            AppError::transport(&url, e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AppError::transport(&url, e))?;

        if status == StatusCode::UNAUTHORIZED {
            if self.development {
                warn!(%method, %url, payload = %body, "Unauthorized, clearing stored credential");
            }
            self.handle_unauthorized();
            return Err(AppError::Unauthorized { body });
        }

        if !status.is_success() {
            if self.development {
                error!(%method, %url, %status, payload = %body, "API request returned an error status");
            }
            return Err(AppError::Http { status, body });
        }

        decode_body(&url, &body)
    }

    fn handle_unauthorized(&self) {
        self.mirror.remove(keys::ACCESS_TOKEN);
        self.mirror.remove(keys::USER_INFO);
        // No subscribers is fine: nobody is around to navigate.
        let _ = self.events.send(SessionEvent::Unauthorized);
    }

    /// POSTs `body` and hands back the raw response body for incremental reads.
    ///
    /// Skips body decoding and the global 401 handling, attaches the bearer
    /// token itself, and applies no request timeout. Any non-2xx status is
    /// returned as an error before streaming starts.
    pub async fn post_stream<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<ByteStream> {
        let url = self.url(path);
        let response = self
            .authorize(self.stream_client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if self.development {
                error!(%url, %status, payload = %body, "Streaming request rejected");
            }
            return Err(AppError::Http { status, body });
        }

        let chunks = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| AppError::Stream { message: e.to_string() })
        });
        Ok(Box::pin(chunks))
    }
}

/// An empty body decodes as JSON `null`, so `()` and `Option<T>` work for
/// endpoints that answer with nothing.
fn decode_body<T: DeserializeOwned>(url: &str, body: &str) -> AppResult<T> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).map_err(|e| AppError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

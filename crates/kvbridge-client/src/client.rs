//! Bridge client

use crate::config::BridgeClientConfig;
use crate::error::{ClientError, ClientResult};
use futures::StreamExt;
use kvbridge_codec::{decode_entry, encode_key, encode_value, CodecError, Entry, Key, Value, WireEntry};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value as Json;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const CURSOR_HEADER: &str = "cursor";

/// Options for [`BridgeClient::browse`]
///
/// `start`/`end` select a range and take precedence over `prefix`.
#[derive(Debug, Clone, Default)]
pub struct BrowseOptions {
    pub prefix: Option<Key>,
    pub start: Option<Key>,
    pub end: Option<Key>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

impl BrowseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: Key) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn start(mut self, start: Key) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: Key) -> Self {
        self.end = Some(end);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = &self.cursor {
            query.push(("cursor", cursor.clone()));
        }
        for (name, key) in [("prefix", &self.prefix), ("start", &self.start), ("end", &self.end)] {
            if let Some(key) = key {
                query.push((name, key_text(key)));
            }
        }
        query
    }
}

/// Options for [`BridgeClient::set`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOptions {
    /// Time to live; sent in whole milliseconds, at least one
    pub expire_in: Option<Duration>,
}

/// Result of a bridge call
///
/// Exactly one of `result` and `error` describes the outcome; `result` is
/// also `None` when a get finds no entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome<T> {
    pub result: Option<T>,
    /// Resume token of a browse page, `None` when the page was empty
    pub cursor: Option<String>,
    pub error: Option<ClientError>,
}

impl<T> CallOutcome<T> {
    fn ok(result: Option<T>, cursor: Option<String>) -> Self {
        Self {
            result,
            cursor,
            error: None,
        }
    }

    fn err(error: ClientError) -> Self {
        Self {
            result: None,
            cursor: None,
            error: Some(error),
        }
    }

    fn from_result(result: ClientResult<Option<T>>) -> Self {
        match result {
            Ok(value) => Self::ok(value, None),
            Err(e) => Self::err(e),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> ClientResult<Option<T>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.result),
        }
    }
}

/// HTTP client for a kvbridge server
///
/// # Example
///
/// ```ignore
/// use kvbridge_client::{BridgeClient, BridgeClientConfig, BrowseOptions};
/// use kvbridge_codec::key;
///
/// let client = BridgeClient::new(BridgeClientConfig::new().base_url("http://127.0.0.1:47168"))?;
/// let page = client.browse(&BrowseOptions::new().prefix(key!["users"]).limit(10)).await;
/// for entry in page.result.unwrap_or_default() {
///     println!("{:?} = {:?}", entry.key, entry.value);
/// }
/// ```
#[derive(Clone)]
pub struct BridgeClient {
    inner: Arc<BridgeClientInner>,
}

struct BridgeClientInner {
    client: reqwest::Client,
    config: BridgeClientConfig,
}

/// Decoded response body
struct Reply {
    status: StatusCode,
    cursor: Option<String>,
    body: Json,
}

fn key_text(key: &Key) -> String {
    encode_key(key).to_string()
}

fn malformed(e: serde_json::Error) -> ClientError {
    ClientError::Decode(CodecError::MalformedInput(e.to_string()))
}

fn expect_true(reply: Reply) -> ClientResult<Option<bool>> {
    match reply.body.get("result") {
        Some(Json::Bool(b)) => Ok(Some(*b)),
        _ => Err(ClientError::Transport(format!(
            "unexpected response body: {}",
            reply.body
        ))),
    }
}

impl BridgeClient {
    pub fn new(config: BridgeClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            inner: Arc::new(BridgeClientInner { client, config }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.config.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.inner.config.base_url, path);
        self.inner.client.request(method, url)
    }

    /// Send a call and read its JSON body
    ///
    /// Error envelopes become `Server` errors; bodies that are not JSON are
    /// transport failures.
    async fn call(&self, builder: RequestBuilder) -> ClientResult<Reply> {
        let response = builder.timeout(self.inner.config.timeout).send().await?;
        let status = response.status();
        let cursor = response
            .headers()
            .get(CURSOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        debug!(status = status.as_u16(), bytes = bytes.len(), "Bridge call completed");

        let body: Json = serde_json::from_slice(&bytes).map_err(|_| {
            ClientError::Transport(format!(
                "non-JSON response (status {}): {}",
                status.as_u16(),
                String::from_utf8_lossy(&bytes)
            ))
        })?;

        if let Some(message) = body.get("error").and_then(Json::as_str) {
            return Err(ClientError::Server {
                status: status.as_u16(),
                message: message.to_string(),
            });
        }
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(ClientError::Server {
                status: status.as_u16(),
                message: body.to_string(),
            });
        }

        Ok(Reply {
            status,
            cursor,
            body,
        })
    }

    /// List entries by prefix or range
    pub async fn browse(&self, options: &BrowseOptions) -> CallOutcome<Vec<Entry>> {
        match self.try_browse(options).await {
            Ok((entries, cursor)) => CallOutcome::ok(Some(entries), cursor),
            Err(e) => CallOutcome::err(e),
        }
    }

    async fn try_browse(&self, options: &BrowseOptions) -> ClientResult<(Vec<Entry>, Option<String>)> {
        let builder = self.request(Method::GET, "/browse").query(&options.query());
        let reply = self.call(builder).await?;

        let wire: Vec<WireEntry> =
            serde_json::from_value(reply.body.get("result").cloned().unwrap_or(Json::Null))
                .map_err(malformed)?;

        let mut entries = Vec::with_capacity(wire.len());
        for item in &wire {
            if let Some(entry) = decode_entry(item)? {
                entries.push(entry);
            }
        }

        let cursor = reply.cursor.or_else(|| {
            reply
                .body
                .get("cursor")
                .and_then(Json::as_str)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
        });
        Ok((entries, cursor))
    }

    /// Read one entry; `result` is `None` when the key is absent
    pub async fn get(&self, key: &Key) -> CallOutcome<Entry> {
        CallOutcome::from_result(self.try_get(key).await)
    }

    async fn try_get(&self, key: &Key) -> ClientResult<Option<Entry>> {
        let path = format!("/get/{}", urlencoding::encode(&key_text(key)));
        let reply = self.call(self.request(Method::GET, &path)).await?;

        let result = reply.body.get("result").cloned().unwrap_or(Json::Null);
        if reply.status == StatusCode::NOT_FOUND || result.is_null() {
            return Ok(None);
        }
        let wire: WireEntry = serde_json::from_value(result).map_err(malformed)?;
        Ok(decode_entry(&wire)?)
    }

    /// Write a value
    pub async fn set(&self, key: &Key, value: &Value, options: SetOptions) -> CallOutcome<bool> {
        let mut query = vec![("key", key_text(key))];
        if let Some(ttl) = options.expire_in {
            query.push(("expires", ttl.as_millis().max(1).to_string()));
        }
        let builder = self
            .request(Method::PUT, "/set")
            .query(&query)
            .json(&encode_value(value));

        CallOutcome::from_result(self.call(builder).await.and_then(expect_true))
    }

    /// Remove a key
    pub async fn delete(&self, key: &Key) -> CallOutcome<bool> {
        let builder = self
            .request(Method::DELETE, "/delete")
            .query(&[("key", key_text(key))]);

        CallOutcome::from_result(self.call(builder).await.and_then(expect_true))
    }

    /// Probe the server's storage
    pub async fn check(&self) -> CallOutcome<bool> {
        let builder = self.request(Method::GET, "/check");
        CallOutcome::from_result(self.call(builder).await.and_then(expect_true))
    }

    /// Follow changes of `key`
    ///
    /// `on_change` first receives the current state, then every change.
    /// Returning [`ControlFlow::Break`] closes the connection. Returns
    /// `Ok(())` when the callback breaks or the server ends the stream.
    pub async fn watch<F>(&self, key: &Key, mut on_change: F) -> ClientResult<()>
    where
        F: FnMut(Option<Entry>) -> ControlFlow<()>,
    {
        let response = self
            .request(Method::GET, "/watch")
            .query(&[("key", key_text(key))])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let bytes = response.bytes().await?;
            let message = serde_json::from_slice::<Json>(&bytes)
                .ok()
                .and_then(|body| body.get("error").and_then(Json::as_str).map(str::to_string))
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let mut frames = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = frames.next().await {
            buffer.extend_from_slice(&chunk?);

            while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                let line = &line[..line.len() - 1];
                if line.is_empty() {
                    continue;
                }

                let wire: WireEntry = serde_json::from_slice(line).map_err(|e| {
                    ClientError::Transport(format!("malformed watch frame: {}", e))
                })?;
                if on_change(decode_entry(&wire)?).is_break() {
                    debug!("Watch closed by caller");
                    return Ok(());
                }
            }
        }

        if !buffer.is_empty() {
            return Err(ClientError::Transport(
                "watch stream ended inside a frame".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for BridgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeClient")
            .field("base_url", &self.inner.config.base_url)
            .field("timeout", &self.inner.config.timeout)
            .finish()
    }
}

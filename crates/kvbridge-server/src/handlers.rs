//! HTTP route handlers
//!
//! Every handler validates its input completely before touching storage.

use crate::error::{BridgeError, BridgeResult};
use crate::params::{required_key, validate_browse_params, validate_set_params, BrowseQuery, KeyQuery, SetQuery};
use axum::body::Body;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures::StreamExt;
use kvbridge_codec::{
    decode_key, decode_value, encode_entries, encode_entry, CodecError, DecodeKeyOptions, Key,
    KeyPart, WireEntry,
};
use kvbridge_store::KvStore;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// Response header carrying the browse cursor
pub const CURSOR_HEADER: &str = "cursor";

const NDJSON: &str = "application/x-ndjson";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KvStore>,
    /// Browse limit used when the request gives none
    pub page_size: usize,
}

#[derive(Debug, Serialize)]
struct BrowseResponse {
    result: Vec<WireEntry>,
    cursor: String,
}

/// Handle GET /browse
pub async fn browse(
    State(state): State<AppState>,
    query: Result<Query<BrowseQuery>, QueryRejection>,
) -> BridgeResult<Response> {
    let Query(query) = query?;
    let range = validate_browse_params(&query)?;
    let page = state
        .store
        .list(&range.selector(), &range.list_options(state.page_size))
        .await?;

    debug!(entries = page.entries.len(), "Browse page served");

    let cursor = page.cursor.clone();
    let body = BrowseResponse {
        result: encode_entries(&page.entries),
        cursor: page.cursor,
    };
    Ok(([(CURSOR_HEADER, cursor)], Json(body)).into_response())
}

/// Handle GET /get/{key}
pub async fn get_entry(
    State(state): State<AppState>,
    raw_key: Result<Path<String>, PathRejection>,
) -> BridgeResult<Response> {
    let Path(raw_key) = raw_key?;
    let key = decode_key(&raw_key, DecodeKeyOptions::default())
        .map_err(|e| BridgeError::serialization("key", e))?;

    match state.store.get(&key).await? {
        Some(entry) => Ok(Json(json!({ "result": encode_entry(&entry) })).into_response()),
        None => Ok((StatusCode::NOT_FOUND, Json(json!({ "result": null }))).into_response()),
    }
}

/// Handle PUT /set
pub async fn set_entry(
    State(state): State<AppState>,
    query: Result<Query<SetQuery>, QueryRejection>,
    body: Bytes,
) -> BridgeResult<Json<serde_json::Value>> {
    let Query(query) = query?;
    let params = validate_set_params(&query)?;

    let envelope: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        BridgeError::serialization("request body", CodecError::MalformedInput(e.to_string()))
    })?;
    let value = decode_value(&envelope).map_err(|e| BridgeError::serialization("value", e))?;

    let versionstamp = state.store.set(&params.key, value, params.expire_in).await?;
    debug!(%versionstamp, expire_in = ?params.expire_in, "Entry set");

    Ok(Json(json!({ "result": true })))
}

/// Handle DELETE /delete
pub async fn delete_entry(
    State(state): State<AppState>,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> BridgeResult<Json<serde_json::Value>> {
    let Query(query) = query?;
    let key = required_key(&query.key, "delete")?;
    state.store.delete(&key).await?;
    Ok(Json(json!({ "result": true })))
}

/// Handle GET /check
///
/// Reads a random key; any storage failure surfaces as a 500.
pub async fn check(State(state): State<AppState>) -> BridgeResult<Json<serde_json::Value>> {
    let probe = Key::new(vec![KeyPart::String(uuid::Uuid::new_v4().to_string())]);
    state.store.get(&probe).await?;
    Ok(Json(json!({ "result": true })))
}

/// Handle GET /watch
///
/// Streams one JSON entry per line: the current state first, then one line
/// per change. The subscription ends when the client disconnects.
pub async fn watch_entry(
    State(state): State<AppState>,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> BridgeResult<Response> {
    let Query(query) = query?;
    let key = required_key(&query.key, "watch")?;
    let changes = state.store.watch(&key).await?;

    info!(parts = key.len(), "Watch stream opened");

    let frames = changes.map(move |item| {
        let wire = match item? {
            Some(entry) => encode_entry(&entry),
            None => WireEntry::absent(&key),
        };
        let mut line =
            serde_json::to_vec(&wire).map_err(|e| BridgeError::Unexpected(e.to_string()))?;
        line.push(b'\n');
        Ok::<_, BridgeError>(Bytes::from(line))
    });

    Ok(([(header::CONTENT_TYPE, NDJSON)], Body::from_stream(frames)).into_response())
}

//! End-to-end tests: a live bridge server driven through `BridgeClient`

use kvbridge_client::{BridgeClient, BridgeClientConfig, BrowseOptions, ClientError, SetOptions};
use kvbridge_codec::{key, BigInteger, Entry, Key, Value};
use kvbridge_server::{BridgeServer, ServerConfig, ServerHandle};
use kvbridge_store::MemoryStore;
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

async fn start() -> (ServerHandle, BridgeClient) {
    let config = ServerConfig::new().bind("127.0.0.1:0".parse().unwrap());
    let handle = BridgeServer::new(Arc::new(MemoryStore::new()), config)
        .spawn()
        .await
        .unwrap();
    let client = BridgeClient::new(BridgeClientConfig::new().base_url(handle.url())).unwrap();
    (handle, client)
}

async fn put(client: &BridgeClient, key: Key, value: Value) {
    let outcome = client.set(&key, &value, SetOptions::default()).await;
    assert_eq!(outcome.into_result(), Ok(Some(true)));
}

fn keys(entries: &[Entry]) -> Vec<Key> {
    entries.iter().map(|e| e.key.clone()).collect()
}

async fn seed_items(client: &BridgeClient, count: usize) -> Vec<Key> {
    let mut all = Vec::new();
    for i in 0..count {
        let key = key!["items", i as f64];
        put(client, key.clone(), Value::Number(i as f64)).await;
        all.push(key);
    }
    all
}

#[tokio::test]
async fn test_check() {
    let (_server, client) = start().await;
    assert_eq!(client.check().await.into_result(), Ok(Some(true)));
}

#[tokio::test]
async fn test_browse_returns_all_entries() {
    let (_server, client) = start().await;
    let all = seed_items(&client, 10).await;

    let outcome = client.browse(&BrowseOptions::new()).await;
    let entries = outcome.result.unwrap();
    assert_eq!(keys(&entries), all);
    assert!(entries.iter().all(|e| !e.versionstamp.is_empty()));
}

#[tokio::test]
async fn test_browse_limit() {
    let (_server, client) = start().await;
    seed_items(&client, 10).await;

    let outcome = client.browse(&BrowseOptions::new().limit(5)).await;
    assert_eq!(outcome.result.unwrap().len(), 5);
    assert!(outcome.cursor.is_some());
}

#[tokio::test]
async fn test_browse_pagination_has_no_gaps_or_overlap() {
    let (_server, client) = start().await;
    let all = seed_items(&client, 10).await;

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;
    loop {
        let mut options = BrowseOptions::new().prefix(key!["items"]).limit(5);
        if let Some(c) = &cursor {
            options = options.cursor(c.clone());
        }
        let outcome = client.browse(&options).await;
        let entries = outcome.result.unwrap();
        if entries.is_empty() {
            assert_eq!(outcome.cursor, None);
            break;
        }
        pages += 1;
        seen.extend(keys(&entries));
        cursor = outcome.cursor;
        assert!(cursor.is_some());
    }

    assert_eq!(pages, 2);
    assert_eq!(seen, all);
}

#[tokio::test]
async fn test_browse_prefix_filtering() {
    let (_server, client) = start().await;
    put(&client, key!["users", "alice"], Value::from("a")).await;
    put(&client, key!["users", "bob"], Value::from("b")).await;
    put(&client, key!["posts", 1.0], Value::from("p")).await;
    put(&client, key!["usersettings"], Value::Null).await;

    let outcome = client
        .browse(&BrowseOptions::new().prefix(key!["users"]))
        .await;
    let entries = outcome.result.unwrap();
    assert_eq!(keys(&entries), vec![key!["users", "alice"], key!["users", "bob"]]);
}

#[tokio::test]
async fn test_browse_range() {
    let (_server, client) = start().await;
    seed_items(&client, 6).await;

    let outcome = client
        .browse(
            &BrowseOptions::new()
                .start(key!["items", 2.0])
                .end(key!["items", 4.0]),
        )
        .await;
    assert_eq!(
        keys(&outcome.result.unwrap()),
        vec![key!["items", 2.0], key!["items", 3.0]]
    );
}

#[tokio::test]
async fn test_browse_invalid_limit() {
    let (_server, client) = start().await;

    let err = client
        .browse(&BrowseOptions::new().limit(0))
        .await
        .into_result()
        .unwrap_err();
    assert_eq!(
        err,
        ClientError::Server {
            status: 400,
            message: "ValidationError: Invalid limit option: must be positive integer. Got: 0"
                .to_string(),
        }
    );
}

#[tokio::test]
async fn test_browse_invalid_limit_raw_text() {
    let (server, _client) = start().await;
    let response = reqwest::get(format!("{}/browse?limit=-1", server.url()))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "ValidationError: Invalid limit option: must be positive integer. Got: -1"
    );
}

#[tokio::test]
async fn test_get_missing_key() {
    let (server, client) = start().await;

    let outcome = client.get(&key!["nope"]).await;
    assert!(outcome.is_ok());
    assert_eq!(outcome.result, None);

    let response = reqwest::get(format!("{}/get/%5B%22nope%22%5D", server.url()))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"result": null}));
}

#[tokio::test]
async fn test_set_then_get_roundtrips_value() {
    let (_server, client) = start().await;

    let mut record = BTreeMap::new();
    record.insert("foo".to_string(), Value::from("bar"));
    record.insert("n".to_string(), Value::Number(42.0));
    record.insert(
        "big".to_string(),
        Value::BigInt("123456789012345678901234567890".parse::<BigInteger>().unwrap()),
    );
    record.insert("raw".to_string(), Value::Bytes(vec![0, 1, 2, 255]));
    let value = Value::Record(record);

    let key = key!["e2e", "set", vec![9u8, 9]];
    put(&client, key.clone(), value.clone()).await;

    let entry = client.get(&key).await.into_result().unwrap().unwrap();
    assert_eq!(entry.key, key);
    assert_eq!(entry.value, value);
    assert!(!entry.versionstamp.is_empty());
}

#[tokio::test]
async fn test_key_with_slash_in_path() {
    let (_server, client) = start().await;
    let key = key!["a/b", "c?d#e"];
    put(&client, key.clone(), Value::Boolean(true)).await;

    let entry = client.get(&key).await.into_result().unwrap().unwrap();
    assert_eq!(entry.key, key);
}

#[tokio::test]
async fn test_set_with_expiration() {
    let (_server, client) = start().await;
    let key = key!["session"];
    let options = SetOptions {
        expire_in: Some(Duration::from_millis(50)),
    };
    let outcome = client.set(&key, &Value::from("token"), options).await;
    assert_eq!(outcome.into_result(), Ok(Some(true)));
    assert!(client.get(&key).await.result.is_some());

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(client.get(&key).await.result.is_none());
}

#[tokio::test]
async fn test_set_rejects_bad_value() {
    let (server, _client) = start().await;
    let response = reqwest::Client::new()
        .put(format!("{}/set?key=%5B%22a%22%5D", server.url()))
        .body(r#"{"type":"Number","data":"twelve"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("SerializationError: value: Invalid Number received"));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (_server, client) = start().await;
    let key = key!["temp"];
    put(&client, key.clone(), Value::Null).await;

    assert_eq!(client.delete(&key).await.into_result(), Ok(Some(true)));
    assert_eq!(client.delete(&key).await.into_result(), Ok(Some(true)));
    assert_eq!(client.get(&key).await.result, None);
}

#[tokio::test]
async fn test_watch_streams_changes() {
    let (_server, client) = start().await;
    let key = key!["watched"];

    let watcher = {
        let client = client.clone();
        let key = key.clone();
        tokio::spawn(async move {
            let mut frames = Vec::new();
            let result = client
                .watch(&key, |entry| {
                    frames.push(entry);
                    if frames.len() == 3 {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                })
                .await;
            result.map(|_| frames)
        })
    };

    // give the watcher time to subscribe
    tokio::time::sleep(Duration::from_millis(100)).await;
    put(&client, key.clone(), Value::Number(1.0)).await;
    put(&client, key!["unrelated"], Value::Null).await;
    assert_eq!(client.delete(&key).await.into_result(), Ok(Some(true)));

    let frames = tokio::time::timeout(Duration::from_secs(5), watcher)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(frames.len(), 3);
    assert!(frames[0].is_none());
    assert_eq!(frames[1].as_ref().unwrap().value, Value::Number(1.0));
    assert!(frames[2].is_none());
}

#[tokio::test]
async fn test_watch_requires_key() {
    let (server, _client) = start().await;
    let response = reqwest::get(format!("{}/watch", server.url())).await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "ValidationError: No target key to watch.");
}

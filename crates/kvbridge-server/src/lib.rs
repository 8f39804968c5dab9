//! HTTP bridge to an ordered key-value store
//!
//! # Endpoints
//! - `GET /browse` lists entries by prefix or range, with cursor pagination
//! - `GET /get/{key}` reads one entry (404 with a null result when absent)
//! - `PUT /set?key=&expires=` writes the wire value in the request body
//! - `DELETE /delete?key=` removes a key
//! - `GET /check` probes storage
//! - `GET /watch?key=` streams changes of one key as NDJSON
//!
//! Keys travel as JSON text in query strings and paths, values as
//! `{"type", "data"}` envelopes. See `kvbridge-codec` for both.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod params;
pub mod server;

pub use app::create_bridge_app;
pub use config::ServerConfig;
pub use error::{BridgeError, BridgeResult, ValidationError};
pub use handlers::AppState;
pub use params::{validate_browse_params, validate_set_params, RangeDescriptor, SetParams};
pub use server::{BridgeServer, ServerHandle};

//! # Lectern
//!
//! A personal audio Bible: readers record themselves reading scripture
//! passages, and the server stores the recordings, gates them per Bible with
//! listen and manage grants, and reports reading-pace analytics.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lectern::auth::TokenGenerator;
//! use lectern::scripture::SharedScripture;
//! use lectern::server::{AppState, create_router};
//! use lectern::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/lectern.db").unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     scripture: Arc::new(SharedScripture::new("./data/scripture.csv")),
//!     tokens: TokenGenerator::new(),
//!     token_ttl_minutes: 1440,
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): builds the `lectern` binary.

pub mod access;
pub mod archive;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod scripture;
pub mod seed;
pub mod server;
pub mod store;
pub mod types;

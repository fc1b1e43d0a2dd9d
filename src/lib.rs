//! # worldbench
//!
//! A database-backed HTTP benchmark service. Nothing more.
//!
//! ## Endpoints
//!
//! | Path | What it exercises |
//! |---|---|
//! | `/json` | JSON serialization |
//! | `/plaintext` | raw response path |
//! | `/db` | one random row read |
//! | `/dbs?queries=N` | N concurrent random row reads |
//! | `/updates?queries=N` | N sequential read-modify-writes |
//! | `/fortunes` | table read, sort, HTML escape |
//!
//! `queries` is clamped into `1..=500`; anything unparsable counts as 1.
//!
//! ## The table
//!
//! `"World"(id, randomnumber)` holds 10,000 rows seeded by an external
//! fixture. worldbench never creates, seeds, or migrates it.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use worldbench::{AppState, Config, PgStore, Server, routes};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), worldbench::Error> {
//!     let config = Config::from_env()?;
//!     let store = PgStore::connect_lazy(&config.database);
//!     let state = AppState::from_config(Arc::new(store), &config.service);
//!
//!     Server::bind(config.service.addr)
//!         .serve(routes::router().with_state(state))
//!         .await
//! }
//! ```
//!
//! Tests and local runs can swap in [`MemoryStore`] for [`PgStore`].

mod app;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod bench;
pub mod config;
pub mod fortunes;
pub mod health;
pub mod middleware;
pub mod queries;
pub mod routes;
pub mod state;
pub mod store;
pub mod world;

pub use app::App;
pub use config::Config;
pub use error::{Error, Result};
pub use handler::Handler;
pub use http::{Method, StatusCode};
pub use queries::QueryCount;
pub use request::Request;
pub use response::{ContentType, Html, IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use state::AppState;
pub use store::{MemoryStore, PgStore, StoreError, WorldStore};
pub use world::{Fortune, World};

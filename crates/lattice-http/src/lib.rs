//! HTTP boundary for the lattice relation graph.
//!
//! Maps verbs and paths onto [`lattice::graph::RelationGraph`] calls. Every
//! relation write goes through the graph service, so both endpoints of an
//! edge are updated no matter which surface issued the call.
//!
//! ```no_run
//! use lattice::app::App;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let router = lattice_http::router(app.graph().clone());
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{ACTOR_HEADER, ActingUser, router};

//! Poembot HTTP service.
//!
//! Serves a single endpoint, `GET /poem`, which returns one randomly chosen
//! poem from the poems table as `{"text": "..."}`, truncated to 1000
//! characters.
//!
//! The body is JSON but is labelled `text/plain`. The service never writes;
//! poems are loaded by the `poembot` generator.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

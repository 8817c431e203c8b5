//! Core types and utilities for poembot.
//!
//! This crate provides the pieces shared by the store, the generator and the
//! HTTP service:
//!
//! - **Keys**: `PoemIndex` and the `poem<index>` row-key convention
//! - **Text**: enumeration cleanup for generated samples and response truncation

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod keys;
pub mod text;

pub use keys::{KeyError, PoemIndex, POEM_KEY_PREFIX};
pub use text::{strip_enumeration, truncate_chars, MAX_RESPONSE_CHARS};

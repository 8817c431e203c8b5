//! API handlers.

pub mod poem;

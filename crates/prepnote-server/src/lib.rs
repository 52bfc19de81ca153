//! PrepNote HTTP server.
//!
//! Exposes text extraction from uploaded documents and LLM-generated study
//! material over a small JSON API.

pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use routes::app;
pub use state::AppState;

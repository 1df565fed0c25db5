//! HTTP Adapter
//!
//! axum router exposing the token, swap, bubble and notification endpoints.

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::{router, serve};
pub use state::AppState;

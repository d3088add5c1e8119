//! Parley API crate - axum HTTP server, route handlers and the embedded page.
//!
//! Serves the image analysis endpoints (`/analyze`, `/chat`), the text chat
//! session API under `/api`, and the browser UI.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;

//! HTTP API: document endpoints, downloads and the static front end.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;

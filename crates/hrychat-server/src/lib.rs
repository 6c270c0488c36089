//! HRY Chat HTTP server: streaming chat, config, and conversation routes.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;

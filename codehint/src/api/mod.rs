pub mod dto;
mod extractors;
pub mod handlers;
mod openapi;
pub mod response;
mod routes;
mod state;

pub use extractors::{AppJson, ValidatedJson};
pub use routes::create_router;
pub use state::AppState;

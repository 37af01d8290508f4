pub mod cache;
pub mod catalog;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod settings;
pub mod sources;
pub mod streams;
pub mod subtitles;
pub mod ws;

pub use handlers::ErrorResponse;
pub use routes::create_router;

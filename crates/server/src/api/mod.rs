pub mod error;
pub mod handlers;
pub mod play;
pub mod routes;
pub mod sources;
pub mod streams;
pub mod torrents;

pub use routes::create_router;

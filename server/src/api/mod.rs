//! Dashboard HTTP server, views and routes

mod embedded;
pub mod middleware;
pub mod routes;
mod server;
pub mod templates;
pub mod types;

pub use server::{ApiServer, build_router};

//! REST API module
//!
//! JSON over HTTP:
//! - POST   /countries/refresh
//! - GET    /countries
//! - GET    /countries/{name}
//! - DELETE /countries/{name}
//! - GET    /countries/image
//! - GET    /status

pub mod handlers;
mod server;
pub mod types;

pub use server::{build_router, cors_layer, ApiServer};

//! Web API module for feedling.
//!
//! A thin JSON layer over the account and feed services. Handlers parse the
//! request, run the bearer gate and map errors; the work happens in
//! [`crate::auth`] and [`crate::feed`].

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_app, create_router};
pub use server::WebServer;

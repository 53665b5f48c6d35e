//! HTTP front for the relay

mod claims;
mod error;
mod handler;
pub mod router;

pub use error::ApiError;
pub use handler::RelayHandler;
pub use router::{build_router, run_server, RelayState};

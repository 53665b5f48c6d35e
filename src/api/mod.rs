//! Wire types for the inbound relay API and the generation backend

mod backend;
mod inbound;

pub use backend::*;
pub use inbound::*;

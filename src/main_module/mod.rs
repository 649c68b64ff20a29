//! HTTP server assembly and process-level endpoints

mod health;
mod server;

pub use health::*;
pub use server::*;

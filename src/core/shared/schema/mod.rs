// Core (always available)
pub mod core;
pub use self::core::*;

pub mod statistics;
pub use self::statistics::*;

pub mod core;
pub use core::shared;

pub mod main_module;
pub mod statistics;
pub mod web;

//! Core translation engine module

pub mod client;
pub mod clock;
pub mod config;
pub mod errors;
pub mod models;
pub mod token;

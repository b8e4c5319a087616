pub mod api;
pub mod codegen;
pub mod config;
pub mod error;
pub mod models;
pub mod recording;

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod schema;
pub mod state;

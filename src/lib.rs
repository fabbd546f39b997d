pub mod api;
pub mod config;
pub mod download;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod workflow;

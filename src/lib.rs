pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod relations;
pub mod services;
pub mod store;

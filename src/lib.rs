pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod permissions;
pub mod registry;
pub mod revert;
pub mod server;
pub mod store;
pub mod types;

pub mod audit;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod permission;
pub mod query;
pub mod resources;
pub mod server;
pub mod validation;

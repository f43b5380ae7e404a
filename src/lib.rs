pub mod api;
pub mod auth;
pub mod client;
pub mod commands;
pub mod config;
pub mod http;
pub mod runtime;

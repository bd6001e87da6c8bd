pub mod auth;
pub mod client;
pub mod config;
pub mod handlers;
pub mod models;
pub mod qr;
pub mod routes;
pub mod state;
pub mod store;
pub mod uploads;
pub mod utils;

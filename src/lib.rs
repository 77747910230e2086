#![doc = "The `taskbook` library crate."]
#![doc = ""]
#![doc = "A personal to-do API: accounts authenticate with opaque bearer tokens and manage"]
#![doc = "their own list of tasks. The crate holds the domain models, the auth and task"]
#![doc = "services, routing and error handling; `main.rs` only reads configuration and"]
#![doc = "starts the server around `app::build`."]

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

pub use error::AppError;
pub use services::Services;

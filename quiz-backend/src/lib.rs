pub mod config;
pub mod error;
pub mod import;
pub mod quiz;
pub mod routes;
pub mod store;

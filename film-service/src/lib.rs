pub mod catalog;
pub mod config;
pub mod models;
pub mod service;

pub use config::ServiceConfig;
pub use service::{AppState, build_router};

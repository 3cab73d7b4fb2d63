pub mod app;
pub mod config;
pub mod logging;
pub mod models;
pub mod state;
pub mod utils;

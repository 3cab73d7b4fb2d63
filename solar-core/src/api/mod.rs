pub mod factory;
pub mod service;

pub mod boot;
pub mod config;
pub mod environment;
pub mod query;
pub mod render;
pub mod runtime;
pub mod types;

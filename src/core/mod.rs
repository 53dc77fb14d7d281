pub mod comments;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod metrics;
pub mod model;

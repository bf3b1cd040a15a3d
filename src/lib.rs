pub mod config;
pub mod error;
pub mod orchestrator;
pub mod rewrite;
pub mod shutdown;
pub mod transcoder;

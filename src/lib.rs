pub mod config;
pub mod enrich;
pub mod error;
pub mod loader;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod sink;
pub mod types;

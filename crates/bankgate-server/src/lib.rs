//! Gateway server for bankgate
//!
//! Wires the send pipeline to its collaborators and serves it over HTTP.

pub mod config;
pub mod pipeline;
pub mod rest;
pub mod server;

pub use config::{ConfigError, GatewayConfig};
pub use pipeline::{Mode, PipelineError, PipelineResponse, SendPipeline, SendRequestSource};
pub use rest::{create_rest_router, RestState};
pub use server::{build_pipeline, open_keyring, run, ServerError};

//! Client library for a RAG question-answering HTTP service
//! (config, HTTP protocol, request lifecycle, terminal rendering).
//! Used by the `rag-query` binary.

pub mod client;
pub mod config;
pub mod controller;
pub mod messages;
pub mod render;

pub use client::{ClientError, QueryBackend, QueryClient};
pub use config::{default_config_path, Config, ConfigError, EndpointSection};
pub use controller::{
    InteractionState, QueryInteractionController, Submission, SubmitRejected, ViewSnapshot,
    QUERY_FAILED_MESSAGE,
};
pub use messages::{QueryRequest, QueryResponse};
pub use render::Renderer;

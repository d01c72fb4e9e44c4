//! Async API client core for the E-sheetbook service.
//!
//! # Overview
//! Every call goes through one `Pipeline`: url resolution, an in-flight
//! guard that rejects duplicate concurrent requests, an ordered interceptor
//! chain, a per-attempt timeout and fixed-interval retry. `SheetbookClient`
//! layers typed, stateless endpoint wrappers (auth, file, sheet, user,
//! website) on top.
//!
//! # Design
//! - The pipeline is built explicitly and passed around; there is no global
//!   client. It cannot be reconfigured once built.
//! - The network sits behind the `Transport` trait. `ReqwestTransport` is the
//!   default; tests substitute scripted transports.
//! - Response bodies are decoded into per-endpoint DTOs at the pipeline
//!   boundary, so a malformed body fails with `ApiError::Decode`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod dedup;
pub mod descriptor;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod pipeline;
pub mod retry;
pub mod routes;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::SheetbookClient;
pub use config::{ConfigError, PipelineConfig};
pub use dedup::{InFlightKey, InFlightRegistry};
pub use descriptor::RequestDescriptor;
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use interceptor::{BearerAuth, ErrorContext, Interceptor, MemoryTokenStore, SessionGuard, TokenStore};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use retry::RetryPolicy;
pub use routes::ApiRoute;
pub use types::*;

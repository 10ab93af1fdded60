// ccnexus-api: Async Rust client for the ccNexus host admin API

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

pub use client::HostClient;
pub use error::Error;
pub use models::{ConfigResponse, EndpointPayload, StatsResponse, WireEndpoint, WireEndpointStats};
pub use transport::{TlsMode, TransportConfig};

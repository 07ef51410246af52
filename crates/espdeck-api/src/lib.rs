// espdeck-api: Async Rust client for the smart-home bridge endpoint

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::BridgeClient;
pub use error::Error;
pub use models::{ActionRequest, ActionResponse, BridgeStatus, Device, LogEntry, LogLevel};
pub use transport::{TlsMode, TransportConfig};

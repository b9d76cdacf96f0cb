// biodesk-api: Async Rust client for the biobank research data REST backend

pub mod client;
pub mod error;
pub mod resource;
pub mod transport;

pub use client::{ApiClient, Health};
pub use error::Error;
pub use resource::{DeleteAck, MAX_PAGE_SIZE, Resource, ResourceClient};
pub use transport::{TlsMode, TransportConfig};

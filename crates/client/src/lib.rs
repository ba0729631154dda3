pub mod api;
pub mod client;
pub mod error;
pub mod token;
pub mod views;

pub use client::{ApiClient, ClientConfig};
pub use error::ClientError;
pub use token::{MemoryTokenStore, TokenStore};

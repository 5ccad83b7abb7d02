//! LocScout embedding providers
//!
//! The search core only sees [`EmbeddingProvider`]; [`OllamaEmbedder`] is the
//! HTTP implementation used by the server.

mod client;
mod provider;
mod types;

pub use client::OllamaEmbedder;
pub use provider::EmbeddingProvider;
pub use types::{EmbedRequest, EmbedResponse};

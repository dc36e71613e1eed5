//! Client side of the inscription indexer service.
//!
//! The indexer registers payloads (returning their content hash), is told
//! when an inscribe transaction has landed, and lists the inscriptions owned
//! by an address. [`IndexerGateway`] is the seam the workflow depends on;
//! [`IndexerClient`] is the HTTP implementation.

pub mod client;
pub mod error;
pub mod gateway;
pub mod model;

pub use client::IndexerClient;
pub use error::IndexerError;
pub use gateway::IndexerGateway;
pub use model::Inscription;

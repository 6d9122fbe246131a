//! Application use cases / business logic

pub mod aggregate;

pub use aggregate::{AggregateConfig, Aggregator, merge};

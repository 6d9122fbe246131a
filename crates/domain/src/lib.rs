//! devstats domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Platform stats, submissions and aggregate results
//! - `normalize`: Handle cleaning applied before any upstream call
//! - `ports`: Trait definitions for upstream clients and handle storage
//! - `usecases`: The cross-platform aggregator

pub mod model;
pub mod normalize;
pub mod ports;
pub mod usecases;

pub use model::*;
pub use normalize::{MAX_HANDLE_LEN, NormalizedHandle, normalize};
pub use ports::*;
pub use usecases::{AggregateConfig, Aggregator, merge};

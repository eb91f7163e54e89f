//! HTTP adapters - REST API implementations.

pub mod delivery;

pub use delivery::{delivery_router, DeliveryAppState};

//! Internal delivery API for business services.

mod dto;
mod handlers;
mod routes;

pub use dto::*;
pub use handlers::{DeliveryApiError, DeliveryAppState};
pub use routes::delivery_router;

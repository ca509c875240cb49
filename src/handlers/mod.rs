mod api;
mod contact;
mod health;
mod metrics;

pub use api::api_handler;
pub use contact::{ClientId, ContactPayload, PayloadRejection, contact_handler};
pub use health::health_handler;
pub use metrics::metrics_handler;

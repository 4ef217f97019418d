//! Middleware modules

pub mod api_key;
pub mod request_id;

pub use api_key::ApiKeyLayer;
pub use request_id::{RequestId, RequestIdLayer};

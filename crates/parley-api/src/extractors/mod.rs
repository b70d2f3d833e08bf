//! Custom Axum extractors.

pub mod auth;
pub mod json;
pub mod multipart;

pub use auth::{AuthUser, MaybeAuthUser};
pub use json::JsonBody;
pub use multipart::UploadForm;

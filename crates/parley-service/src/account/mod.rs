//! Account use cases: sign-up, sign-in, and profile management.

pub mod normalize;
pub mod request;
pub mod service;

pub use request::{SignInRequest, SignUpRequest};
pub use service::{AccountService, AuthSession};

//! # parley-auth
//!
//! Authentication primitives for Parley.
//!
//! ## Modules
//!
//! - `jwt`: session token issuing and verification
//! - `password`: Argon2id hashing and the sign-up password policy

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::{PasswordHasher, PasswordValidator};

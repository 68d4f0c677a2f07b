//! Authentication
//!
//! Bearer token verification for the API. Tokens are minted by the identity
//! provider; requests carry them in the `Authorization` header.

mod error;
pub mod jwt;
mod middleware;

pub use error::{AuthError, AuthResult};
pub use middleware::{require_auth, AuthUser};

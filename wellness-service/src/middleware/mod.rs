pub mod auth;

pub use auth::{AccessTokenClaims, AuthUser, JwtVerifier};

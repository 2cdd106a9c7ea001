//! Credential handling

pub mod jwt;

pub use jwt::{create_token, verify_token, JwtConfig, JwtIdentityProvider, TokenClaims};

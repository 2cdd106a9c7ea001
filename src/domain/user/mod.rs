//! Users and verified identities
//!
//! Registration and credentials live elsewhere; this module only carries
//! what the core needs to know about who is calling.

pub mod identity;
pub mod model;
pub mod repository;

pub use identity::{Identity, IdentityError, IdentityProvider};
pub use model::{User, UserRole};
pub use repository::UserRepository;

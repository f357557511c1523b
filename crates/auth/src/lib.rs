//! `couture-auth` — authentication/authorization boundary for the back office.
//!
//! Guest checkout and tracking need no identity; admin actions (payment
//! verification, status updates) are gated here. The crate is decoupled from
//! HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, CommandAuthorization, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::Permission;
pub use principal::PrincipalId;
pub use roles::Role;

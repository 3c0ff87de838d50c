//! `blogdesk-auth` — principal, scope and credential model for the client.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod credentials;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize_scope};
pub use credentials::{CredentialError, Credentials, validate_expiry};
pub use principal::{Principal, PrincipalPatch};
pub use roles::Role;

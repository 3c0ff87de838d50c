use thiserror::Error;

use crate::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("no scope is held; role '{0}' required")]
    MissingScope(Role),

    #[error("forbidden: role '{required}' required, scope is '{actual}'")]
    WrongRole { required: Role, actual: String },
}

/// Check a locally persisted scope against a required role.
///
/// - No IO
/// - No panics
/// - Exact comparison; the server remains the final arbiter for every call
pub fn authorize_scope(scope: Option<&str>, required: &Role) -> Result<(), AuthzError> {
    match scope {
        None => Err(AuthzError::MissingScope(required.clone())),
        Some(scope) if required.is_granted_by(scope) => Ok(()),
        Some(scope) => Err(AuthzError::WrongRole {
            required: required.clone(),
            actual: scope.to_string(),
        }),
    }
}

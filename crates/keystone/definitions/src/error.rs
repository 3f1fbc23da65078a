use std::fmt;

use keystone_types::{Address, InvalidBitmap, RoleId, Selector, TxAction};
use thiserror::Error;

/// Which side of a definition batch a bound applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchKind {
    Schemas,
    Permissions,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchKind::Schemas => write!(f, "schemas"),
            BatchKind::Permissions => write!(f, "permissions"),
        }
    }
}

/// Errors from schema registration, role grants and definition loading.
///
/// Every error aborts the whole enclosing load; nothing is partially applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    // --- Shape / bounds ---
    #[error("batch size exceeded: {actual} {kind}, maximum {max}")]
    BatchSizeExceeded {
        kind: BatchKind,
        actual: usize,
        max: usize,
    },

    #[error("array length mismatch: {roles} role ids for {permissions} permissions")]
    LengthMismatch { roles: usize, permissions: usize },

    #[error("selector {0} appears more than once in the batch")]
    DuplicateInBatch(Selector),

    #[error("schema {selector} lists delegate {delegate} more than once")]
    DuplicateDelegate {
        selector: Selector,
        delegate: Selector,
    },

    #[error("{selector} carries {source}")]
    UndefinedActions {
        selector: Selector,
        source: InvalidBitmap,
    },

    // --- Identity ---
    #[error("no schema registered for selector {0}")]
    UnknownSchema(Selector),

    #[error("role not found: {0}")]
    UnknownRole(RoleId),

    #[error("delegate {delegate} is not declared by schema {selector}")]
    UnknownDelegate {
        selector: Selector,
        delegate: Selector,
    },

    #[error("{0} does not advertise the definition provider capability")]
    NotADefinitionProvider(Address),

    #[error("definitions from {0} were already applied")]
    DuplicateProvider(Address),

    // --- Integrity ---
    #[error("schema {0} is protected and cannot be overwritten")]
    ProtectedCollision(Selector),

    #[error("schema {0} is marked protected but this load does not allow protected schemas")]
    ProtectedNotAllowed(Selector),

    #[error(
        "grant to role {role} on {selector} exceeds schema capability: granted {granted:?}, declared {declared:?}"
    )]
    BitmapExceedsSchema {
        role: RoleId,
        selector: Selector,
        granted: TxAction,
        declared: TxAction,
    },
}

impl DefinitionError {
    /// True for failures caused by the write-once protection rule.
    pub fn is_protection_error(&self) -> bool {
        matches!(
            self,
            DefinitionError::ProtectedCollision(_) | DefinitionError::ProtectedNotAllowed(_)
        )
    }

    /// True for failures detected before any state was staged.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            DefinitionError::BatchSizeExceeded { .. } | DefinitionError::LengthMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DefinitionError>;

//! # keystone-definitions
//!
//! Permission/schema composition for Keystone components.
//!
//! A component's privileged operations are described by two registries it
//! owns privately:
//!
//! - **OperationSchemaRegistry**: per selector, the authorization actions the
//!   operation supports and whether the entry is protected (write-once)
//! - **RolePermissionTable**: per (role, selector), the actions that role may
//!   exercise, always clamped to the schema's declared actions
//!
//! Both are only ever written through the **DefinitionLoader**, which merges a
//! batch from a definition provider all-or-nothing: bounds and shape are
//! checked before anything is touched, the batch is applied to a staged copy,
//! and the copy replaces the live state only if every entry was accepted.
//!
//! ```text
//! provider ──▶ [bounds/shape] ──▶ stage.register(schemas) ──▶ stage.grant(perms) ──▶ commit
//!                    │                     │                          │
//!                    └──────── any error: live store untouched ───────┘
//! ```

pub mod component;
pub mod error;
pub mod limits;
pub mod loader;
pub mod mocks;
pub mod permissions;
pub mod registry;

pub use component::ComponentDefinitions;
pub use error::{BatchKind, DefinitionError, Result};
pub use limits::DefinitionLimits;
pub use loader::{DefinitionLoader, DefinitionStore, LoadReport};
pub use mocks::{MockIntrospection, MockRoleDirectory, StaticDefinitionProvider};
pub use permissions::RolePermissionTable;
pub use registry::OperationSchemaRegistry;

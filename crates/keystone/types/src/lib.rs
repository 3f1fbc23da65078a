//! # keystone-types
//!
//! Shared vocabulary for the Keystone account framework.
//!
//! Every deployable component carries its own permission data: a set of
//! operation schemas (which authorization actions each privileged operation
//! supports) and a table of role grants (which of those actions a role may
//! exercise). This crate defines the data both sides agree on:
//!
//! - **Identifiers**: [`Address`], [`Selector`], [`RoleId`], [`OperationType`]
//! - **Authorization actions**: [`TxAction`], a typed bitflag set with the
//!   subset check used to clamp every grant
//! - **Definitions**: [`OperationSchema`], [`RolePermission`], [`DefinitionBundle`]
//! - **Transactions**: [`TxRecord`], [`TxStatus`], [`PaymentDetails`],
//!   [`LifecycleEvent`]
//! - **Collaborators**: traits for the external pieces this layer consumes
//!   but does not implement (execution engine lookups, capability
//!   introspection, role store, definition providers, event sinks).

pub mod action;
pub mod ids;
pub mod payment;
pub mod record;
pub mod schema;
pub mod traits;

pub use action::{InvalidBitmap, TxAction};
pub use ids::{roles, signatures, Address, IdParseError, OperationType, RoleId, Selector};
pub use payment::{PaymentDetails, PriceConfig};
pub use record::{LifecycleEvent, TxParams, TxRecord, TxStatus};
pub use schema::{DefinitionBundle, OperationSchema, RolePermission, RolePermissionSet};
pub use traits::{
    CallReverted, CapabilityIntrospection, CapabilityTag, DefinitionProvider, EventSink,
    ExecutionEngine, PostActionHook, RoleDirectory,
};

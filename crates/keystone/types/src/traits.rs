//! Collaborators this layer consumes but does not implement.
//!
//! Each is a seam: production wires the host's real engine, role store and
//! introspection; tests substitute doubles.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::TxAction;
use crate::ids::{Address, RoleId, Selector};
use crate::record::{LifecycleEvent, TxRecord};
use crate::schema::{OperationSchema, RolePermissionSet};

/// Opaque failure of a call into another component. The callee's reason is
/// kept for logs only; callers must not branch on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("call reverted: {reason}")]
pub struct CallReverted {
    pub reason: String,
}

impl CallReverted {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Capabilities a component's code can advertise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityTag {
    /// The base multi-phase state machine every component carries.
    BaseStateMachine,
    /// Accepts the extended initializer with custom init data.
    ExtendedInitialization,
    /// Exposes operation schemas and role permissions for loading.
    DefinitionProvider,
}

/// Given an address and a capability tag, does the code there advertise it?
pub trait CapabilityIntrospection: Send + Sync {
    fn supports(&self, address: &Address, tag: CapabilityTag) -> bool;
}

/// Lookup surface the execution engine enforces time-delay and co-signed
/// workflows against. This layer only populates the data behind it.
pub trait ExecutionEngine {
    fn get_schema(&self, selector: &Selector) -> Option<OperationSchema>;

    /// Granted actions, or the empty set when there is no grant.
    fn get_permission(&self, role: &RoleId, selector: &Selector) -> TxAction;
}

/// Role/ownership store. Roles are created and limited elsewhere.
pub trait RoleDirectory: Send + Sync {
    fn role_exists(&self, role: &RoleId) -> bool;
}

/// Any component that ships operation schemas and role permissions.
pub trait DefinitionProvider: Send + Sync {
    fn operation_schemas(&self) -> Vec<OperationSchema>;

    fn role_permissions(&self) -> RolePermissionSet;
}

/// Receiver of lifecycle notifications.
pub trait EventSink: Send + Sync {
    /// `caller` is the component delivering the notification.
    fn on_event(&self, caller: &Address, event: &LifecycleEvent) -> Result<(), CallReverted>;
}

/// Runs when an operation reaches its terminal completed state.
///
/// The engine must treat an `Err` as fatal to the completion.
pub trait PostActionHook: Send + Sync {
    type Error: std::error::Error;

    fn post_action(&self, record: &TxRecord) -> Result<(), Self::Error>;
}

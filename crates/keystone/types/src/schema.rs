use serde::{Deserialize, Serialize};

use crate::action::TxAction;
use crate::ids::{OperationType, RoleId, Selector};

/// Declares which authorization actions a privileged operation supports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSchema {
    pub selector: Selector,
    pub operation_type: OperationType,
    pub operation_name: String,
    pub capabilities: TxAction,
    /// Once committed, a protected schema can never be overwritten.
    #[serde(default)]
    pub is_protected: bool,
    /// Operations this schema acts as a dispatch handler for. Ordered, no repeats.
    #[serde(default)]
    pub delegate_selectors: Vec<Selector>,
}

impl OperationSchema {
    /// Schema for the operation named by `signature`; the selector is derived from it.
    pub fn new(
        signature: impl Into<String>,
        operation_type: OperationType,
        capabilities: TxAction,
    ) -> Self {
        let operation_name = signature.into();
        Self {
            selector: Selector::from_signature(&operation_name),
            operation_type,
            operation_name,
            capabilities,
            is_protected: false,
            delegate_selectors: Vec::new(),
        }
    }

    pub fn protected(mut self) -> Self {
        self.is_protected = true;
        self
    }

    pub fn with_delegates(mut self, delegates: impl IntoIterator<Item = Selector>) -> Self {
        self.delegate_selectors = delegates.into_iter().collect();
        self
    }
}

/// Actions one role may exercise on one operation.
///
/// The role itself travels alongside (see [`RolePermissionSet`]), matching
/// the parallel-array shape definition providers emit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub selector: Selector,
    pub granted: TxAction,
    #[serde(default)]
    pub delegate_selectors: Vec<Selector>,
}

impl RolePermission {
    pub fn new(selector: Selector, granted: TxAction) -> Self {
        Self {
            selector,
            granted,
            delegate_selectors: Vec::new(),
        }
    }

    pub fn with_delegates(mut self, delegates: impl IntoIterator<Item = Selector>) -> Self {
        self.delegate_selectors = delegates.into_iter().collect();
        self
    }
}

/// Parallel arrays: `permissions[i]` is granted to `role_ids[i]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissionSet {
    pub role_ids: Vec<RoleId>,
    pub permissions: Vec<RolePermission>,
}

impl RolePermissionSet {
    pub fn push(&mut self, role: RoleId, permission: RolePermission) {
        self.role_ids.push(role);
        self.permissions.push(permission);
    }
}

/// Schemas and grants produced together by one definition provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionBundle {
    pub schemas: Vec<OperationSchema>,
    #[serde(flatten)]
    pub grants: RolePermissionSet,
}

impl DefinitionBundle {
    pub fn new(schemas: Vec<OperationSchema>, grants: RolePermissionSet) -> Self {
        Self { schemas, grants }
    }
}

//! The factory's own operation schemas and role grants.
//!
//! Every administrative operation is reachable only through the guarded
//! execution macro, so the macro schema lists each of them as a delegate.
//! All schemas are protected: no later load may redefine them.

use keystone_types::{
    roles, signatures, DefinitionBundle, DefinitionProvider, OperationSchema, OperationType,
    RolePermission, RolePermissionSet, Selector, TxAction,
};

pub const CLONE_OPERATION: &str = "CLONE";
pub const WHITELIST_OPERATION: &str = "WHITELIST";
pub const FORWARDER_OPERATION: &str = "EVENT_FORWARDER";

/// Owners request, approve, cancel and sign.
const OWNER_ACTIONS: TxAction = TxAction::TIME_DELAY.union(TxAction::META_SIGN);
/// Broadcasters only submit signed operations.
const BROADCASTER_ACTIONS: TxAction = TxAction::META_EXECUTE;

fn admin_operations() -> [(&'static str, &'static str); 5] {
    [
        (signatures::CREATE, CLONE_OPERATION),
        (signatures::ADD_TO_WHITELIST, WHITELIST_OPERATION),
        (signatures::REMOVE_FROM_WHITELIST, WHITELIST_OPERATION),
        (signatures::SET_CLONE_PRICE, WHITELIST_OPERATION),
        (signatures::SET_EVENT_FORWARDER, FORWARDER_OPERATION),
    ]
}

pub fn guarded_execution_selector() -> Selector {
    Selector::from_signature(signatures::GUARDED_EXECUTION)
}

/// Built-in definitions installed into every factory at construction.
pub fn factory_bundle() -> DefinitionBundle {
    let operations: Vec<OperationSchema> = admin_operations()
        .into_iter()
        .map(|(sig, op_type)| {
            OperationSchema::new(sig, OperationType::new(op_type), TxAction::all()).protected()
        })
        .collect();
    let delegates: Vec<Selector> = operations.iter().map(|s| s.selector).collect();

    let macro_schema = OperationSchema::new(
        signatures::GUARDED_EXECUTION,
        OperationType::new("GUARDED_EXECUTION"),
        TxAction::all(),
    )
    .protected()
    .with_delegates(delegates.iter().copied());

    let mut grants = RolePermissionSet::default();
    grants.push(
        roles::owner(),
        RolePermission::new(macro_schema.selector, OWNER_ACTIONS)
            .with_delegates(delegates.iter().copied()),
    );
    grants.push(
        roles::broadcaster(),
        RolePermission::new(macro_schema.selector, BROADCASTER_ACTIONS)
            .with_delegates(delegates.iter().copied()),
    );
    for schema in &operations {
        grants.push(roles::owner(), RolePermission::new(schema.selector, OWNER_ACTIONS));
        grants.push(
            roles::broadcaster(),
            RolePermission::new(schema.selector, BROADCASTER_ACTIONS),
        );
    }

    let mut schemas = vec![macro_schema];
    schemas.extend(operations);
    DefinitionBundle::new(schemas, grants)
}

/// [`factory_bundle`] exposed through the provider interface.
#[derive(Clone, Copy, Debug, Default)]
pub struct FactoryDefinitions;

impl DefinitionProvider for FactoryDefinitions {
    fn operation_schemas(&self) -> Vec<OperationSchema> {
        factory_bundle().schemas
    }

    fn role_permissions(&self) -> RolePermissionSet {
        factory_bundle().grants
    }
}

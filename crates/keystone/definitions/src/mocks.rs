//! Test doubles for the collaborators this crate consumes.

use std::collections::{HashMap, HashSet};

use keystone_types::{
    roles, Address, CapabilityIntrospection, CapabilityTag, DefinitionProvider, OperationSchema,
    RoleDirectory, RoleId, RolePermissionSet,
};
use parking_lot::RwLock;

/// Role store that knows a fixed, growable set of roles.
#[derive(Default)]
pub struct MockRoleDirectory {
    roles: RwLock<HashSet<RoleId>>,
}

impl MockRoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// OWNER, BROADCASTER and RECOVERY.
    pub fn with_builtin_roles() -> Self {
        let dir = Self::new();
        dir.add(roles::owner());
        dir.add(roles::broadcaster());
        dir.add(roles::recovery());
        dir
    }

    pub fn add(&self, role: RoleId) {
        self.roles.write().insert(role);
    }
}

impl RoleDirectory for MockRoleDirectory {
    fn role_exists(&self, role: &RoleId) -> bool {
        self.roles.read().contains(role)
    }
}

/// Capability introspection backed by an explicit table.
///
/// Unknown addresses advertise nothing.
#[derive(Default)]
pub struct MockIntrospection {
    advertised: RwLock<HashMap<Address, HashSet<CapabilityTag>>>,
}

impl MockIntrospection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advertise(&self, address: Address, tag: CapabilityTag) {
        self.advertised.write().entry(address).or_default().insert(tag);
    }

    /// A plain component: base state machine only.
    pub fn advertise_component(&self, address: Address) {
        self.advertise(address, CapabilityTag::BaseStateMachine);
    }

    /// A component that also accepts custom init data.
    pub fn advertise_extended_component(&self, address: Address) {
        self.advertise(address, CapabilityTag::BaseStateMachine);
        self.advertise(address, CapabilityTag::ExtendedInitialization);
    }
}

impl CapabilityIntrospection for MockIntrospection {
    fn supports(&self, address: &Address, tag: CapabilityTag) -> bool {
        self.advertised
            .read()
            .get(address)
            .map(|tags| tags.contains(&tag))
            .unwrap_or(false)
    }
}

/// Definition provider returning fixed outputs.
#[derive(Clone, Debug, Default)]
pub struct StaticDefinitionProvider {
    schemas: Vec<OperationSchema>,
    grants: RolePermissionSet,
}

impl StaticDefinitionProvider {
    pub fn new(schemas: Vec<OperationSchema>, grants: RolePermissionSet) -> Self {
        Self { schemas, grants }
    }
}

impl DefinitionProvider for StaticDefinitionProvider {
    fn operation_schemas(&self) -> Vec<OperationSchema> {
        self.schemas.clone()
    }

    fn role_permissions(&self) -> RolePermissionSet {
        self.grants.clone()
    }
}

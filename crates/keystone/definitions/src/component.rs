use std::collections::BTreeSet;

use keystone_types::{
    Address, CapabilityIntrospection, CapabilityTag, DefinitionBundle, DefinitionProvider,
    ExecutionEngine, OperationSchema, RoleId, Selector, TxAction,
};
use tracing::info;

use crate::error::{DefinitionError, Result};
use crate::loader::{DefinitionLoader, DefinitionStore, LoadReport};

/// Permission state of one deployable component.
///
/// Built-in definitions are installed with [`install_system`](Self::install_system)
/// and may be protected. Definitions from external providers go through
/// [`apply_provider`](Self::apply_provider), which never admits protected
/// schemas and applies each provider address at most once.
#[derive(Debug, Clone)]
pub struct ComponentDefinitions {
    address: Address,
    store: DefinitionStore,
    loader: DefinitionLoader,
    providers: BTreeSet<Address>,
}

impl ComponentDefinitions {
    pub fn new(address: Address, loader: DefinitionLoader) -> Self {
        Self {
            address,
            store: DefinitionStore::new(),
            loader,
            providers: BTreeSet::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn store(&self) -> &DefinitionStore {
        &self.store
    }

    /// Install the component's own definitions. Protected schemas allowed.
    pub fn install_system(&mut self, bundle: &DefinitionBundle) -> Result<LoadReport> {
        self.loader.load_bundle(&mut self.store, bundle, true)
    }

    /// Administrative load of an explicit batch.
    pub fn load(&mut self, bundle: &DefinitionBundle, allow_protected: bool) -> Result<LoadReport> {
        self.loader.load_bundle(&mut self.store, bundle, allow_protected)
    }

    /// Read a provider's schemas and grants and merge them.
    pub fn apply_provider(
        &mut self,
        provider_address: Address,
        provider: &dyn DefinitionProvider,
        introspection: &dyn CapabilityIntrospection,
    ) -> Result<LoadReport> {
        if !introspection.supports(&provider_address, CapabilityTag::DefinitionProvider) {
            return Err(DefinitionError::NotADefinitionProvider(provider_address));
        }
        if self.providers.contains(&provider_address) {
            return Err(DefinitionError::DuplicateProvider(provider_address));
        }

        let bundle = DefinitionBundle::new(provider.operation_schemas(), provider.role_permissions());
        let report = self.loader.load_bundle(&mut self.store, &bundle, false)?;

        self.providers.insert(provider_address);
        info!(
            component = %self.address,
            provider = %provider_address,
            schemas = report.schemas_registered,
            permissions = report.permissions_granted,
            "Definition provider applied"
        );
        Ok(report)
    }

    pub fn applied_providers(&self) -> impl Iterator<Item = &Address> {
        self.providers.iter()
    }
}

impl ExecutionEngine for ComponentDefinitions {
    fn get_schema(&self, selector: &Selector) -> Option<OperationSchema> {
        self.store.get_schema(selector)
    }

    fn get_permission(&self, role: &RoleId, selector: &Selector) -> TxAction {
        self.store.get_permission(role, selector)
    }
}

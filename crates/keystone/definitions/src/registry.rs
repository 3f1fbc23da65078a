use std::collections::{BTreeMap, HashSet};

use keystone_types::{OperationSchema, Selector, TxAction};
use tracing::{debug, info};

use crate::error::{DefinitionError, Result};

/// Operation Schema Registry: per selector, the actions an operation
/// supports.
///
/// Protection is a per-entry flag rather than a separate registry: a
/// protected entry is written once and every later write to its selector is
/// rejected. Non-protected entries are last-write-wins.
#[derive(Clone, Debug, Default)]
pub struct OperationSchemaRegistry {
    schemas: BTreeMap<Selector, OperationSchema>,
}

impl OperationSchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one schema.
    pub fn register(&mut self, schema: OperationSchema, allow_protected: bool) -> Result<()> {
        self.check_register(&schema, allow_protected)?;
        self.commit(schema);
        Ok(())
    }

    /// Register a batch. Either every schema is committed or none is.
    pub fn register_batch(
        &mut self,
        schemas: &[OperationSchema],
        allow_protected: bool,
    ) -> Result<()> {
        let mut seen = HashSet::with_capacity(schemas.len());
        for schema in schemas {
            if !seen.insert(schema.selector) {
                return Err(DefinitionError::DuplicateInBatch(schema.selector));
            }
            self.check_register(schema, allow_protected)?;
        }

        for schema in schemas {
            self.commit(schema.clone());
        }
        Ok(())
    }

    /// Validate a registration against current state without applying it.
    pub fn check_register(&self, schema: &OperationSchema, allow_protected: bool) -> Result<()> {
        if let Some(existing) = self.schemas.get(&schema.selector) {
            if existing.is_protected {
                return Err(DefinitionError::ProtectedCollision(schema.selector));
            }
        }

        if schema.is_protected && !allow_protected {
            return Err(DefinitionError::ProtectedNotAllowed(schema.selector));
        }

        TxAction::from_raw(schema.capabilities.bits()).map_err(|source| {
            DefinitionError::UndefinedActions {
                selector: schema.selector,
                source,
            }
        })?;

        let mut delegates = HashSet::with_capacity(schema.delegate_selectors.len());
        for delegate in &schema.delegate_selectors {
            if !delegates.insert(*delegate) {
                return Err(DefinitionError::DuplicateDelegate {
                    selector: schema.selector,
                    delegate: *delegate,
                });
            }
        }

        Ok(())
    }

    fn commit(&mut self, schema: OperationSchema) {
        let selector = schema.selector;
        match self.schemas.insert(selector, schema) {
            Some(previous) => debug!(
                selector = %selector,
                operation = %previous.operation_name,
                "Schema overwritten"
            ),
            None => info!(selector = %selector, "Schema registered"),
        }
    }

    pub fn get(&self, selector: &Selector) -> Option<&OperationSchema> {
        self.schemas.get(selector)
    }

    pub fn contains(&self, selector: &Selector) -> bool {
        self.schemas.contains_key(selector)
    }

    pub fn is_protected(&self, selector: &Selector) -> bool {
        self.schemas
            .get(selector)
            .map(|s| s.is_protected)
            .unwrap_or(false)
    }

    pub fn selectors(&self) -> impl Iterator<Item = &Selector> {
        self.schemas.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationSchema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

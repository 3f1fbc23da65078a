use std::collections::BTreeMap;

use keystone_types::{OperationSchema, RoleId, RolePermission, Selector, TxAction};
use tracing::info;

use crate::error::{DefinitionError, Result};
use crate::registry::OperationSchemaRegistry;

/// Role Permission Table: (role, selector) → granted actions.
///
/// The selector in each key is the back-reference to the schema the grant is
/// clamped against. A grant is replaced whole; bitmaps are never merged.
#[derive(Clone, Debug, Default)]
pub struct RolePermissionTable {
    grants: BTreeMap<(RoleId, Selector), RolePermission>,
}

impl RolePermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `permission` to `role`, replacing any prior grant for the pair.
    pub fn grant(
        &mut self,
        schemas: &OperationSchemaRegistry,
        role: RoleId,
        permission: RolePermission,
    ) -> Result<()> {
        let schema = schemas
            .get(&permission.selector)
            .ok_or(DefinitionError::UnknownSchema(permission.selector))?;

        check_fits(schema, &role, &permission)?;

        info!(
            role = %role,
            selector = %permission.selector,
            granted = ?permission.granted,
            "Permission granted"
        );
        self.grants.insert((role, permission.selector), permission);
        Ok(())
    }

    /// Verify every grant on `schema.selector` still fits `schema`.
    ///
    /// Run after a schema is overwritten, since the new version may declare
    /// fewer actions or fewer delegates.
    pub fn check_schema_covers_grants(&self, schema: &OperationSchema) -> Result<()> {
        for ((role, _), permission) in self
            .grants
            .iter()
            .filter(|((_, sel), _)| *sel == schema.selector)
        {
            check_fits(schema, role, permission)?;
        }
        Ok(())
    }

    /// Granted actions for the pair, or the empty set. The empty set means
    /// "no permission" whether or not a grant was ever written.
    pub fn permission(&self, role: &RoleId, selector: &Selector) -> TxAction {
        self.grants
            .get(&(*role, *selector))
            .map(|p| p.granted)
            .unwrap_or_default()
    }

    pub fn grant_entry(&self, role: &RoleId, selector: &Selector) -> Option<&RolePermission> {
        self.grants.get(&(*role, *selector))
    }

    pub fn permissions_for_role(&self, role: &RoleId) -> Vec<&RolePermission> {
        self.grants
            .iter()
            .filter(|((r, _), _)| r == role)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn roles_for_selector(&self, selector: &Selector) -> Vec<RoleId> {
        self.grants
            .keys()
            .filter(|(_, s)| s == selector)
            .map(|(r, _)| *r)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

/// Granted actions must be defined and declared by the schema; delegates
/// must be declared by the schema.
fn check_fits(schema: &OperationSchema, role: &RoleId, permission: &RolePermission) -> Result<()> {
    TxAction::from_raw(permission.granted.bits()).map_err(|source| {
        DefinitionError::UndefinedActions {
            selector: schema.selector,
            source,
        }
    })?;

    if !permission.granted.is_subset_of(schema.capabilities) {
        return Err(DefinitionError::BitmapExceedsSchema {
            role: *role,
            selector: schema.selector,
            granted: permission.granted,
            declared: schema.capabilities,
        });
    }

    for delegate in &permission.delegate_selectors {
        if !schema.delegate_selectors.contains(delegate) {
            return Err(DefinitionError::UnknownDelegate {
                selector: schema.selector,
                delegate: *delegate,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_types::{roles, OperationType};

    fn registry_with(schema: &OperationSchema) -> OperationSchemaRegistry {
        let mut reg = OperationSchemaRegistry::new();
        reg.register(schema.clone(), false).unwrap();
        reg
    }

    fn transfer_schema() -> OperationSchema {
        OperationSchema::new(
            "transfer(address,uint256)",
            OperationType::new("TRANSFER"),
            TxAction::TIME_DELAY | TxAction::SIGN_META_APPROVE,
        )
    }

    #[test]
    fn grant_within_schema() {
        let schema = transfer_schema();
        let reg = registry_with(&schema);
        let mut table = RolePermissionTable::new();

        table
            .grant(
                &reg,
                roles::owner(),
                RolePermission::new(schema.selector, TxAction::TIME_DELAY_REQUEST),
            )
            .unwrap();

        assert_eq!(
            table.permission(&roles::owner(), &schema.selector),
            TxAction::TIME_DELAY_REQUEST
        );
        assert_eq!(table.roles_for_selector(&schema.selector), vec![roles::owner()]);
    }

    #[test]
    fn grant_beyond_schema_rejected() {
        let schema = transfer_schema();
        let reg = registry_with(&schema);
        let mut table = RolePermissionTable::new();

        let err = table
            .grant(
                &reg,
                roles::broadcaster(),
                RolePermission::new(schema.selector, TxAction::EXECUTE_META_APPROVE),
            )
            .unwrap_err();
        assert!(matches!(err, DefinitionError::BitmapExceedsSchema { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn grant_unknown_schema_rejected() {
        let reg = OperationSchemaRegistry::new();
        let mut table = RolePermissionTable::new();
        let sel = Selector::from_signature("nope()");
        assert_eq!(
            table.grant(&reg, roles::owner(), RolePermission::new(sel, TxAction::empty())),
            Err(DefinitionError::UnknownSchema(sel))
        );
    }

    #[test]
    fn regrant_replaces_without_merging() {
        let schema = transfer_schema();
        let reg = registry_with(&schema);
        let mut table = RolePermissionTable::new();
        let owner = roles::owner();

        table
            .grant(&reg, owner, RolePermission::new(schema.selector, TxAction::TIME_DELAY))
            .unwrap();
        table
            .grant(
                &reg,
                owner,
                RolePermission::new(schema.selector, TxAction::SIGN_META_APPROVE),
            )
            .unwrap();

        assert_eq!(
            table.permission(&owner, &schema.selector),
            TxAction::SIGN_META_APPROVE
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn absent_and_empty_grants_look_the_same() {
        let schema = transfer_schema();
        let reg = registry_with(&schema);
        let mut table = RolePermissionTable::new();
        table
            .grant(
                &reg,
                roles::recovery(),
                RolePermission::new(schema.selector, TxAction::empty()),
            )
            .unwrap();

        assert!(table.permission(&roles::recovery(), &schema.selector).is_empty());
        assert!(table.permission(&roles::owner(), &schema.selector).is_empty());
    }

    #[test]
    fn delegate_must_be_declared_by_schema() {
        let declared = Selector::from_signature("inner()");
        let schema = transfer_schema().with_delegates([declared]);
        let reg = registry_with(&schema);
        let mut table = RolePermissionTable::new();

        table
            .grant(
                &reg,
                roles::owner(),
                RolePermission::new(schema.selector, TxAction::TIME_DELAY_REQUEST)
                    .with_delegates([declared]),
            )
            .unwrap();
        assert_eq!(
            table
                .grant_entry(&roles::owner(), &schema.selector)
                .map(|p| p.delegate_selectors.clone()),
            Some(vec![declared])
        );

        let stray = Selector::from_signature("other()");
        assert_eq!(
            table.grant(
                &reg,
                roles::owner(),
                RolePermission::new(schema.selector, TxAction::TIME_DELAY_REQUEST)
                    .with_delegates([stray]),
            ),
            Err(DefinitionError::UnknownDelegate {
                selector: schema.selector,
                delegate: stray
            })
        );
    }

    #[test]
    fn undefined_granted_bits_rejected() {
        let schema = transfer_schema();
        let reg = registry_with(&schema);
        let mut table = RolePermissionTable::new();

        let err = table
            .grant(
                &reg,
                roles::owner(),
                RolePermission::new(schema.selector, TxAction::from_bits_retain(0x8000)),
            )
            .unwrap_err();
        assert!(matches!(err, DefinitionError::UndefinedActions { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn dropped_delegate_detected_against_existing_grants() {
        let inner = Selector::from_signature("inner()");
        let schema = transfer_schema().with_delegates([inner]);
        let reg = registry_with(&schema);
        let mut table = RolePermissionTable::new();
        table
            .grant(
                &reg,
                roles::owner(),
                RolePermission::new(schema.selector, TxAction::TIME_DELAY_REQUEST)
                    .with_delegates([inner]),
            )
            .unwrap();

        let without_delegates = transfer_schema();
        assert_eq!(
            table.check_schema_covers_grants(&without_delegates),
            Err(DefinitionError::UnknownDelegate {
                selector: schema.selector,
                delegate: inner
            })
        );
    }

    #[test]
    fn narrowed_schema_detected_against_existing_grants() {
        let schema = transfer_schema();
        let reg = registry_with(&schema);
        let mut table = RolePermissionTable::new();
        table
            .grant(
                &reg,
                roles::owner(),
                RolePermission::new(schema.selector, TxAction::SIGN_META_APPROVE),
            )
            .unwrap();

        let mut narrowed = schema.clone();
        narrowed.capabilities = TxAction::TIME_DELAY;
        assert!(matches!(
            table.check_schema_covers_grants(&narrowed),
            Err(DefinitionError::BitmapExceedsSchema { .. })
        ));
        assert!(table.check_schema_covers_grants(&schema).is_ok());
    }
}

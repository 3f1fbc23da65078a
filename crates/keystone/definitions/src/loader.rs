use std::sync::Arc;

use keystone_types::{
    DefinitionBundle, ExecutionEngine, OperationSchema, RoleDirectory, RoleId, RolePermission,
    Selector, TxAction,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BatchKind, DefinitionError, Result};
use crate::limits::DefinitionLimits;
use crate::permissions::RolePermissionTable;
use crate::registry::OperationSchemaRegistry;

/// The two registries one component owns.
///
/// Serves the execution engine's lookups. Written only through
/// [`DefinitionLoader::load`].
#[derive(Clone, Debug, Default)]
pub struct DefinitionStore {
    schemas: OperationSchemaRegistry,
    permissions: RolePermissionTable,
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schemas(&self) -> &OperationSchemaRegistry {
        &self.schemas
    }

    pub fn permissions(&self) -> &RolePermissionTable {
        &self.permissions
    }

    pub fn schema(&self, selector: &Selector) -> Option<&OperationSchema> {
        self.schemas.get(selector)
    }

    pub fn permission(&self, role: &RoleId, selector: &Selector) -> TxAction {
        self.permissions.permission(role, selector)
    }
}

impl ExecutionEngine for DefinitionStore {
    fn get_schema(&self, selector: &Selector) -> Option<OperationSchema> {
        self.schemas.get(selector).cloned()
    }

    fn get_permission(&self, role: &RoleId, selector: &Selector) -> TxAction {
        self.permissions.permission(role, selector)
    }
}

/// Counts from a successful load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub schemas_registered: usize,
    pub permissions_granted: usize,
}

/// Definition Loader: merges one batch of schemas and grants into a store.
///
/// Schemas are registered first so grants in the same batch can reference
/// them. Grants on every schema in the batch are then re-checked against the
/// new version. Any failure leaves the store exactly as it was.
#[derive(Clone)]
pub struct DefinitionLoader {
    limits: DefinitionLimits,
    roles: Arc<dyn RoleDirectory>,
}

impl DefinitionLoader {
    pub fn new(limits: DefinitionLimits, roles: Arc<dyn RoleDirectory>) -> Self {
        Self { limits, roles }
    }

    pub fn limits(&self) -> &DefinitionLimits {
        &self.limits
    }

    pub fn load(
        &self,
        store: &mut DefinitionStore,
        schemas: &[OperationSchema],
        role_ids: &[RoleId],
        permissions: &[RolePermission],
        allow_protected_schemas: bool,
    ) -> Result<LoadReport> {
        self.limits.check(BatchKind::Schemas, schemas.len())?;
        self.limits.check(BatchKind::Permissions, permissions.len())?;
        if role_ids.len() != permissions.len() {
            return Err(DefinitionError::LengthMismatch {
                roles: role_ids.len(),
                permissions: permissions.len(),
            });
        }

        let mut staged = store.clone();
        if let Err(e) = self.apply(
            &mut staged,
            schemas,
            role_ids,
            permissions,
            allow_protected_schemas,
        ) {
            warn!(error = %e, "Definition load rejected");
            return Err(e);
        }
        *store = staged;

        let report = LoadReport {
            schemas_registered: schemas.len(),
            permissions_granted: permissions.len(),
        };
        info!(
            schemas = report.schemas_registered,
            permissions = report.permissions_granted,
            allow_protected = allow_protected_schemas,
            "Definitions loaded"
        );
        Ok(report)
    }

    pub fn load_bundle(
        &self,
        store: &mut DefinitionStore,
        bundle: &DefinitionBundle,
        allow_protected_schemas: bool,
    ) -> Result<LoadReport> {
        self.load(
            store,
            &bundle.schemas,
            &bundle.grants.role_ids,
            &bundle.grants.permissions,
            allow_protected_schemas,
        )
    }

    fn apply(
        &self,
        stage: &mut DefinitionStore,
        schemas: &[OperationSchema],
        role_ids: &[RoleId],
        permissions: &[RolePermission],
        allow_protected_schemas: bool,
    ) -> Result<()> {
        stage.schemas.register_batch(schemas, allow_protected_schemas)?;

        for (role, permission) in role_ids.iter().zip(permissions) {
            if !self.roles.role_exists(role) {
                return Err(DefinitionError::UnknownRole(*role));
            }
            stage
                .permissions
                .grant(&stage.schemas, *role, permission.clone())?;
        }

        // An overwritten schema may have narrowed. Grants it still has,
        // whether kept from earlier loads or written above, must fit it.
        for schema in schemas {
            stage.permissions.check_schema_covers_grants(schema)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for DefinitionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionLoader")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockRoleDirectory;
    use keystone_types::{roles, OperationType, RolePermissionSet};

    fn loader() -> DefinitionLoader {
        DefinitionLoader::new(
            DefinitionLimits::default(),
            Arc::new(MockRoleDirectory::with_builtin_roles()),
        )
    }

    fn schema(sig: &str, caps: TxAction) -> OperationSchema {
        OperationSchema::new(sig, OperationType::new("TEST"), caps)
    }

    fn bundle() -> DefinitionBundle {
        let mint = schema("mint(address,uint256)", TxAction::TIME_DELAY | TxAction::META_SIGN);
        let burn = schema("burn(uint256)", TxAction::TIME_DELAY);
        let mut grants = RolePermissionSet::default();
        grants.push(
            roles::owner(),
            RolePermission::new(mint.selector, TxAction::TIME_DELAY),
        );
        grants.push(
            roles::owner(),
            RolePermission::new(burn.selector, TxAction::TIME_DELAY_REQUEST),
        );
        DefinitionBundle::new(vec![mint, burn], grants)
    }

    #[test]
    fn load_registers_schemas_then_grants() {
        let mut store = DefinitionStore::new();
        let b = bundle();
        let report = loader().load_bundle(&mut store, &b, false).unwrap();

        assert_eq!(report.schemas_registered, 2);
        assert_eq!(report.permissions_granted, 2);
        assert_eq!(
            store.get_permission(&roles::owner(), &b.schemas[0].selector),
            TxAction::TIME_DELAY
        );
        assert!(store.get_schema(&b.schemas[1].selector).is_some());
    }

    #[test]
    fn length_mismatch_rejected_before_mutation() {
        let mut store = DefinitionStore::new();
        let b = bundle();
        let err = loader()
            .load(
                &mut store,
                &b.schemas,
                &b.grants.role_ids[..1],
                &b.grants.permissions,
                false,
            )
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::LengthMismatch {
                roles: 1,
                permissions: 2
            }
        );
        assert!(store.schemas().is_empty());
    }

    #[test]
    fn failing_grant_discards_schemas_from_same_batch() {
        let mut store = DefinitionStore::new();
        let mut b = bundle();
        b.grants.permissions[1].granted = TxAction::EXECUTE_META_CANCEL;

        let err = loader().load_bundle(&mut store, &b, false).unwrap_err();
        assert!(matches!(err, DefinitionError::BitmapExceedsSchema { .. }));
        assert!(store.schemas().is_empty());
        assert!(store.permissions().is_empty());
    }

    #[test]
    fn unknown_role_rejected() {
        let mut store = DefinitionStore::new();
        let mut b = bundle();
        let stranger = RoleId::from_name("STRANGER_ROLE");
        b.grants.role_ids[0] = stranger;

        assert_eq!(
            loader().load_bundle(&mut store, &b, false),
            Err(DefinitionError::UnknownRole(stranger))
        );
        assert!(store.schemas().is_empty());
    }

    #[test]
    fn grant_may_reference_previously_loaded_schema() {
        let mut store = DefinitionStore::new();
        let b = bundle();
        let loader = loader();
        loader
            .load(&mut store, &b.schemas, &[], &[], false)
            .unwrap();

        loader
            .load(
                &mut store,
                &[],
                &[roles::broadcaster()],
                &[RolePermission::new(
                    b.schemas[0].selector,
                    TxAction::SIGN_META_APPROVE,
                )],
                false,
            )
            .unwrap();
        assert_eq!(
            store.permission(&roles::broadcaster(), &b.schemas[0].selector),
            TxAction::SIGN_META_APPROVE
        );
    }

    #[test]
    fn narrowing_a_granted_schema_is_rejected() {
        let mut store = DefinitionStore::new();
        let b = bundle();
        let loader = loader();
        loader.load_bundle(&mut store, &b, false).unwrap();

        let mut narrowed = b.schemas[0].clone();
        narrowed.capabilities = TxAction::TIME_DELAY_REQUEST;
        let err = loader
            .load(&mut store, &[narrowed], &[], &[], false)
            .unwrap_err();
        assert!(matches!(err, DefinitionError::BitmapExceedsSchema { .. }));
        assert_eq!(store.schema(&b.schemas[0].selector), Some(&b.schemas[0]));
    }

    #[test]
    fn narrowing_with_regrant_in_same_batch_succeeds() {
        let mut store = DefinitionStore::new();
        let op = schema("op()", TxAction::TIME_DELAY);
        let loader = loader();
        loader
            .load(
                &mut store,
                &[op.clone()],
                &[roles::owner()],
                &[RolePermission::new(op.selector, TxAction::TIME_DELAY_APPROVE)],
                false,
            )
            .unwrap();

        let mut narrowed = op.clone();
        narrowed.capabilities = TxAction::TIME_DELAY_REQUEST;
        loader
            .load(
                &mut store,
                &[narrowed.clone()],
                &[roles::owner()],
                &[RolePermission::new(op.selector, TxAction::TIME_DELAY_REQUEST)],
                false,
            )
            .unwrap();

        assert_eq!(store.schema(&op.selector), Some(&narrowed));
        assert_eq!(
            store.permission(&roles::owner(), &op.selector),
            TxAction::TIME_DELAY_REQUEST
        );
    }

    #[test]
    fn narrowing_leaves_other_roles_checked() {
        let mut store = DefinitionStore::new();
        let op = schema("op()", TxAction::TIME_DELAY);
        let loader = loader();
        loader
            .load(
                &mut store,
                &[op.clone()],
                &[roles::owner(), roles::recovery()],
                &[
                    RolePermission::new(op.selector, TxAction::TIME_DELAY_APPROVE),
                    RolePermission::new(op.selector, TxAction::TIME_DELAY_APPROVE),
                ],
                false,
            )
            .unwrap();

        let mut narrowed = op.clone();
        narrowed.capabilities = TxAction::TIME_DELAY_REQUEST;
        let err = loader
            .load(
                &mut store,
                &[narrowed],
                &[roles::owner()],
                &[RolePermission::new(op.selector, TxAction::TIME_DELAY_REQUEST)],
                false,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::BitmapExceedsSchema { role, .. } if role == roles::recovery()
        ));
        assert_eq!(store.schema(&op.selector), Some(&op));
        assert_eq!(
            store.permission(&roles::owner(), &op.selector),
            TxAction::TIME_DELAY_APPROVE
        );
    }

    #[test]
    fn dropping_a_granted_delegate_is_rejected() {
        let mut store = DefinitionStore::new();
        let inner = Selector::from_signature("inner()");
        let outer = schema("outer()", TxAction::TIME_DELAY).with_delegates([inner]);
        let loader = loader();
        loader
            .load(
                &mut store,
                &[outer.clone()],
                &[roles::owner()],
                &[RolePermission::new(outer.selector, TxAction::TIME_DELAY_REQUEST)
                    .with_delegates([inner])],
                false,
            )
            .unwrap();

        let bare = schema("outer()", TxAction::TIME_DELAY);
        assert_eq!(
            loader.load(&mut store, &[bare], &[], &[], false),
            Err(DefinitionError::UnknownDelegate {
                selector: outer.selector,
                delegate: inner
            })
        );
        assert_eq!(store.schema(&outer.selector), Some(&outer));
    }

    #[test]
    fn undefined_bits_in_bundle_json_never_load() {
        let b = bundle();
        let valid = serde_json::to_value(&b).unwrap();
        assert_eq!(serde_json::from_value::<DefinitionBundle>(valid.clone()).unwrap(), b);

        let mut wide_schema = valid.clone();
        wide_schema["schemas"][0]["capabilities"] = "0x8000".into();
        assert!(serde_json::from_value::<DefinitionBundle>(wide_schema).is_err());

        let mut wide_grant = valid;
        wide_grant["permissions"][0]["granted"] = "0x8000".into();
        assert!(serde_json::from_value::<DefinitionBundle>(wide_grant).is_err());

        let mut store = DefinitionStore::new();
        let mut smuggled = b.schemas[0].clone();
        smuggled.capabilities = TxAction::from_bits_retain(0x8000 | TxAction::TIME_DELAY.bits());
        assert!(matches!(
            loader().load(&mut store, &[smuggled], &[], &[], false),
            Err(DefinitionError::UndefinedActions { .. })
        ));
        assert!(store.schemas().is_empty());
    }

    #[test]
    fn protected_schemas_need_explicit_allowance() {
        let mut store = DefinitionStore::new();
        let locked = schema("upgrade(address)", TxAction::TIME_DELAY).protected();
        let loader = loader();

        assert_eq!(
            loader.load(&mut store, &[locked.clone()], &[], &[], false),
            Err(DefinitionError::ProtectedNotAllowed(locked.selector))
        );
        loader
            .load(&mut store, &[locked.clone()], &[], &[], true)
            .unwrap();
        assert!(store.schemas().is_protected(&locked.selector));
    }
}

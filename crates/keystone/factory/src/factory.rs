use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use keystone_definitions::{ComponentDefinitions, DefinitionLimits, DefinitionLoader};
use keystone_types::{
    Address, CallReverted, CapabilityIntrospection, CapabilityTag, EventSink, ExecutionEngine,
    LifecycleEvent, OperationSchema, PostActionHook, PriceConfig, RoleDirectory, RoleId, Selector,
    TxAction, TxRecord, TxStatus,
};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::definitions::factory_bundle;
use crate::error::FactoryError;
use crate::events::FactoryEvent;
use crate::guard::ReentrancyGuard;
use crate::instances::InstanceRegistry;
use crate::request::CreateRequest;
use crate::traits::{CloningPrimitive, InitArgs, InitializerCall, InstanceRuntime};
use crate::whitelist::TemplateWhitelist;

/// External collaborators a factory calls into.
#[derive(Clone)]
pub struct FactoryEnvironment {
    pub introspection: Arc<dyn CapabilityIntrospection>,
    pub cloner: Arc<dyn CloningPrimitive>,
    pub runtime: Arc<dyn InstanceRuntime>,
    pub roles: Arc<dyn RoleDirectory>,
}

/// The factory's own upstream lifecycle sink.
#[derive(Clone)]
pub struct Upstream {
    pub address: Address,
    pub sink: Arc<dyn EventSink>,
}

impl Upstream {
    pub fn new(address: Address, sink: Arc<dyn EventSink>) -> Self {
        Self { address, sink }
    }
}

#[derive(Default)]
struct FactoryState {
    whitelist: TemplateWhitelist,
    instances: InstanceRegistry,
    journal: Vec<FactoryEvent>,
}

/// Controlled Factory.
///
/// Shared state (whitelist, prices, instances) is written only by this type.
/// No lock is held while calling into collaborators; nested calls during
/// that window are refused by the re-entrancy guard instead.
pub struct ControlledFactory {
    address: Address,
    definitions: ComponentDefinitions,
    state: RwLock<FactoryState>,
    upstream: RwLock<Option<Upstream>>,
    guard: ReentrancyGuard,
    env: FactoryEnvironment,
}

impl ControlledFactory {
    /// Create a factory at `address` with its built-in definitions installed.
    pub fn new(
        address: Address,
        env: FactoryEnvironment,
        limits: DefinitionLimits,
    ) -> Result<Self, FactoryError> {
        let loader = DefinitionLoader::new(limits, env.roles.clone());
        let mut definitions = ComponentDefinitions::new(address, loader);
        definitions.install_system(&factory_bundle())?;

        info!(factory = %address, "Controlled factory initialized");

        Ok(Self {
            address,
            definitions,
            state: RwLock::new(FactoryState::default()),
            upstream: RwLock::new(None),
            guard: ReentrancyGuard::new(),
            env,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn definitions(&self) -> &ComponentDefinitions {
        &self.definitions
    }

    fn only_self(&self, caller: &Address) -> Result<(), FactoryError> {
        if *caller != self.address {
            warn!(caller = %caller, "Direct call to self-only operation rejected");
            return Err(FactoryError::NotSelf { caller: *caller });
        }
        Ok(())
    }

    fn require_component(&self, template: &Address) -> Result<(), FactoryError> {
        if !self
            .env
            .introspection
            .supports(template, CapabilityTag::BaseStateMachine)
        {
            return Err(FactoryError::NotAComponent(*template));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Whitelist & pricing
    // ---------------------------------------------------------------------

    /// Whitelist `template` at `price`. Returns `false` without re-pricing
    /// if it was already whitelisted.
    pub fn add_to_whitelist(
        &self,
        caller: &Address,
        template: Address,
        price: PriceConfig,
    ) -> Result<bool, FactoryError> {
        let _entered = self.guard.enter()?;
        self.only_self(caller)?;
        self.require_component(&template)?;

        let mut state = self.state.write();
        if !state.whitelist.insert(template, price) {
            debug!(template = %template, "Template already whitelisted");
            return Ok(false);
        }
        state
            .journal
            .push(FactoryEvent::TemplateWhitelisted { template, price });
        info!(template = %template, price = ?price, "Template whitelisted");
        Ok(true)
    }

    /// Remove `template` and its price. Returns `false` if it was not whitelisted.
    pub fn remove_from_whitelist(
        &self,
        caller: &Address,
        template: &Address,
    ) -> Result<bool, FactoryError> {
        let _entered = self.guard.enter()?;
        self.only_self(caller)?;

        let mut state = self.state.write();
        if !state.whitelist.remove(template) {
            return Ok(false);
        }
        state.journal.push(FactoryEvent::TemplateRemoved {
            template: *template,
        });
        info!(template = %template, "Template removed from whitelist");
        Ok(true)
    }

    /// Re-price an already whitelisted template.
    pub fn set_clone_price(
        &self,
        caller: &Address,
        template: &Address,
        price: PriceConfig,
    ) -> Result<(), FactoryError> {
        let _entered = self.guard.enter()?;
        self.only_self(caller)?;

        let mut state = self.state.write();
        state.whitelist.set_price(template, price)?;
        state.journal.push(FactoryEvent::ClonePriceUpdated {
            template: *template,
            price,
        });
        info!(template = %template, price = ?price, "Clone price updated");
        Ok(())
    }

    /// Configure (or clear) the sink this factory relays instance events to.
    pub fn set_event_forwarder(
        &self,
        caller: &Address,
        upstream: Option<Upstream>,
    ) -> Result<(), FactoryError> {
        let _entered = self.guard.enter()?;
        self.only_self(caller)?;

        let forwarder = upstream.as_ref().map(|u| u.address);
        *self.upstream.write() = upstream;
        self.state
            .write()
            .journal
            .push(FactoryEvent::EventForwarderUpdated { forwarder });
        info!(forwarder = ?forwarder, "Event forwarder updated");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------------

    /// Clone `request.template` and initialize the new instance.
    ///
    /// Checks, first failure wins: caller is the factory; the template is a
    /// component; non-empty init data needs extended initialization; the
    /// template is whitelisted.
    pub fn create(&self, caller: &Address, request: &CreateRequest) -> Result<Address, FactoryError> {
        let _entered = self.guard.enter()?;
        self.only_self(caller)?;

        let template = request.template;
        self.require_component(&template)?;
        let extended = !request.init_data.is_empty();
        if extended
            && !self
                .env
                .introspection
                .supports(&template, CapabilityTag::ExtendedInitialization)
        {
            return Err(FactoryError::UnsupportedInitialization(template));
        }
        if !self.state.read().whitelist.contains(&template) {
            return Err(FactoryError::NotWhitelisted(template));
        }

        let instance = self.env.cloner.clone_template(&template).map_err(|e| {
            warn!(template = %template, reason = %e.reason, "Template clone failed");
            FactoryError::CreationFailed { template }
        })?;

        let args = InitArgs {
            owner: request.owner,
            broadcaster: request.broadcaster,
            recovery: request.recovery,
            time_lock_period: request.time_lock_period,
            event_forwarder: self.address,
        };
        let call = if extended {
            InitializerCall::Extended {
                args,
                init_data: request.init_data.clone(),
            }
        } else {
            InitializerCall::Standard(args)
        };

        if let Err(e) = self.env.runtime.initialize(&instance, &call) {
            warn!(
                template = %template,
                instance = %instance,
                reason = %e.reason,
                "Instance initializer failed"
            );
            return Err(FactoryError::CreationFailed { template });
        }

        let mut state = self.state.write();
        let instance_count = state.instances.append(instance);
        state.journal.push(FactoryEvent::InstanceCreated {
            template,
            instance,
            owner: request.owner,
            instance_count,
        });
        info!(
            template = %template,
            instance = %instance,
            owner = %request.owner,
            extended,
            instance_count,
            "Instance created"
        );
        Ok(instance)
    }

    // ---------------------------------------------------------------------
    // Post-completion payment check
    // ---------------------------------------------------------------------

    /// Compare the payment declared on a completed `create` operation with
    /// the template's configured price.
    pub fn verify_completed_payment(&self, record: &TxRecord) -> Result<(), FactoryError> {
        if record.status != TxStatus::Completed {
            return Ok(());
        }
        if record.params.execution_selector != CreateRequest::selector() {
            return Ok(());
        }

        let request = CreateRequest::decode(&record.params.execution_params)?;
        let expected = self.state.read().whitelist.price(&request.template);
        if expected != record.payment {
            warn!(
                tx_id = record.tx_id,
                template = %request.template,
                mismatched = ?expected.mismatched_fields(&record.payment),
                "Clone payment mismatch"
            );
            return Err(FactoryError::InvalidPayment {
                template: request.template,
                expected,
                actual: record.payment,
            });
        }

        debug!(tx_id = record.tx_id, template = %request.template, "Clone payment verified");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Lifecycle aggregation
    // ---------------------------------------------------------------------

    /// Accept a lifecycle event from one of this factory's instances and
    /// relay it upstream. Relay failures are swallowed.
    pub fn forward_event(&self, caller: &Address, event: &LifecycleEvent) -> Result<(), FactoryError> {
        if !self.state.read().instances.contains(caller) {
            return Err(FactoryError::NoPermission(*caller));
        }

        let upstream = self.upstream.read().clone();
        let Some(upstream) = upstream else {
            return Ok(());
        };
        if upstream.address == self.address {
            return Ok(());
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            upstream.sink.on_event(&self.address, event)
        }));
        match outcome {
            Ok(Ok(())) => debug!(
                instance = %caller,
                tx_id = event.tx_id,
                upstream = %upstream.address,
                "Lifecycle event forwarded"
            ),
            Ok(Err(e)) => warn!(
                instance = %caller,
                upstream = %upstream.address,
                reason = %e.reason,
                "Upstream sink rejected lifecycle event"
            ),
            Err(_) => warn!(
                instance = %caller,
                upstream = %upstream.address,
                "Upstream sink panicked on lifecycle event"
            ),
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn instance_count(&self) -> usize {
        self.state.read().instances.len()
    }

    pub fn instance_at(&self, index: usize) -> Result<Address, FactoryError> {
        self.state.read().instances.at(index)
    }

    pub fn is_instance(&self, address: &Address) -> bool {
        self.state.read().instances.contains(address)
    }

    pub fn instances(&self) -> Vec<Address> {
        self.state.read().instances.all().to_vec()
    }

    pub fn whitelist_count(&self) -> usize {
        self.state.read().whitelist.len()
    }

    pub fn whitelisted_at(&self, index: usize) -> Result<Address, FactoryError> {
        self.state.read().whitelist.at(index)
    }

    pub fn is_whitelisted(&self, template: &Address) -> bool {
        self.state.read().whitelist.contains(template)
    }

    /// Configured price, or the zero price for templates not whitelisted.
    pub fn clone_price(&self, template: &Address) -> PriceConfig {
        self.state.read().whitelist.price(template)
    }

    pub fn whitelisted_templates(&self) -> Vec<Address> {
        self.state.read().whitelist.templates().to_vec()
    }

    pub fn event_forwarder(&self) -> Option<Address> {
        self.upstream.read().as_ref().map(|u| u.address)
    }

    /// Notifications emitted so far, oldest first.
    pub fn events(&self) -> Vec<FactoryEvent> {
        self.state.read().journal.clone()
    }
}

impl ExecutionEngine for ControlledFactory {
    fn get_schema(&self, selector: &Selector) -> Option<OperationSchema> {
        self.definitions.get_schema(selector)
    }

    fn get_permission(&self, role: &RoleId, selector: &Selector) -> TxAction {
        self.definitions.get_permission(role, selector)
    }
}

impl PostActionHook for ControlledFactory {
    type Error = FactoryError;

    fn post_action(&self, record: &TxRecord) -> Result<(), FactoryError> {
        self.verify_completed_payment(record)
    }
}

/// Factories accept events like any other sink, so they can be chained.
impl EventSink for ControlledFactory {
    fn on_event(&self, caller: &Address, event: &LifecycleEvent) -> Result<(), CallReverted> {
        self.forward_event(caller, event)
            .map_err(|e| CallReverted::new(e.to_string()))
    }
}

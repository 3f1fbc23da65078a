//! Test doubles for the factory's external collaborators.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use keystone_types::{Address, CallReverted, EventSink, LifecycleEvent};
use parking_lot::{Mutex, RwLock};

use crate::traits::{CloningPrimitive, InitializerCall, InstanceRuntime};

pub use keystone_definitions::{MockIntrospection, MockRoleDirectory};

/// Cloner that hands out deterministic addresses derived from a counter.
#[derive(Default)]
pub struct MockCloner {
    counter: AtomicU64,
    fail: AtomicBool,
}

impl MockCloner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn clones_made(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl CloningPrimitive for MockCloner {
    fn clone_template(&self, template: &Address) -> Result<Address, CallReverted> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CallReverted::new("clone deployment failed"));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(Address::derive(&format!("{template}/clone-{n}")))
    }
}

type InitHook = Box<dyn Fn(&Address, &InitializerCall) -> Result<(), CallReverted> + Send + Sync>;

/// Runtime that records initializer calls.
///
/// An optional hook runs inside `initialize`, standing in for instance code
/// that might call back into the factory.
#[derive(Default)]
pub struct MockInstanceRuntime {
    calls: Mutex<Vec<(Address, InitializerCall)>>,
    fail: AtomicBool,
    hook: RwLock<Option<InitHook>>,
}

impl MockInstanceRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_hook<F>(&self, hook: F)
    where
        F: Fn(&Address, &InitializerCall) -> Result<(), CallReverted> + Send + Sync + 'static,
    {
        *self.hook.write() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> Vec<(Address, InitializerCall)> {
        self.calls.lock().clone()
    }
}

impl InstanceRuntime for MockInstanceRuntime {
    fn initialize(&self, instance: &Address, call: &InitializerCall) -> Result<(), CallReverted> {
        self.calls.lock().push((*instance, call.clone()));
        if let Some(hook) = self.hook.read().as_ref() {
            hook(instance, call)?;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(CallReverted::new("initializer reverted"));
        }
        Ok(())
    }
}

/// Sink that keeps every event it receives.
#[derive(Default)]
pub struct RecordingSink {
    received: Mutex<Vec<(Address, LifecycleEvent)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<(Address, LifecycleEvent)> {
        self.received.lock().clone()
    }
}

impl EventSink for RecordingSink {
    fn on_event(&self, caller: &Address, event: &LifecycleEvent) -> Result<(), CallReverted> {
        self.received.lock().push((*caller, event.clone()));
        Ok(())
    }
}

/// Sink that rejects everything.
#[derive(Default)]
pub struct FailingSink;

impl EventSink for FailingSink {
    fn on_event(&self, _caller: &Address, _event: &LifecycleEvent) -> Result<(), CallReverted> {
        Err(CallReverted::new("sink unavailable"))
    }
}

/// Sink that panics on delivery.
#[derive(Default)]
pub struct PanickingSink;

impl EventSink for PanickingSink {
    fn on_event(&self, _caller: &Address, _event: &LifecycleEvent) -> Result<(), CallReverted> {
        panic!("sink crashed")
    }
}

use keystone_types::{Address, CallReverted};
use serde::{Deserialize, Serialize};

/// Minimal-proxy cloning: a new address whose code delegates to the
/// template and whose storage is independent.
pub trait CloningPrimitive: Send + Sync {
    fn clone_template(&self, template: &Address) -> Result<Address, CallReverted>;
}

/// Arguments of the standard five-argument initializer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitArgs {
    pub owner: Address,
    pub broadcaster: Address,
    pub recovery: Address,
    pub time_lock_period: u64,
    /// Lifecycle-event sink for the new instance.
    pub event_forwarder: Address,
}

/// The two initializer shapes a fresh instance may be called with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitializerCall {
    Standard(InitArgs),
    Extended { args: InitArgs, init_data: Vec<u8> },
}

impl InitializerCall {
    pub fn args(&self) -> &InitArgs {
        match self {
            InitializerCall::Standard(args) => args,
            InitializerCall::Extended { args, .. } => args,
        }
    }

    pub fn is_extended(&self) -> bool {
        matches!(self, InitializerCall::Extended { .. })
    }
}

/// Low-level dynamic dispatch into a freshly cloned instance.
///
/// Implementations report failure without structure; the factory does not
/// surface the callee's reason.
pub trait InstanceRuntime: Send + Sync {
    fn initialize(&self, instance: &Address, call: &InitializerCall) -> Result<(), CallReverted>;
}

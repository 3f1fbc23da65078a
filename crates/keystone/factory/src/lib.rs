//! # keystone-factory
//!
//! Controlled Factory: creates component instances from trusted templates.
//!
//! ## Responsibilities
//!
//! - **Whitelist & pricing**: only templates that advertise the base state
//!   machine may be whitelisted; each carries an administrator-set price that
//!   is deleted with its whitelist entry
//! - **Creation**: clone, initialize through the standard or extended path,
//!   register the instance; any initializer failure surfaces uniformly as
//!   [`FactoryError::CreationFailed`]
//! - **Payment verification**: after the enclosing guarded operation
//!   completes, the payment declared at request time must equal the
//!   template's price or the completion fails
//! - **Lifecycle aggregation**: instances report to the factory, which
//!   relays to its own upstream sink; relay failures never reach the instance
//!
//! Every mutating entry point is callable only by the factory on its own
//! behalf (the execution engine routes time-delayed and co-signed calls that
//! way) and is guarded against nested re-entry.

pub mod definitions;
pub mod error;
pub mod events;
pub mod factory;
pub mod guard;
pub mod instances;
pub mod mocks;
pub mod request;
pub mod traits;
pub mod whitelist;

pub use definitions::{factory_bundle, FactoryDefinitions};
pub use error::FactoryError;
pub use events::FactoryEvent;
pub use factory::{ControlledFactory, FactoryEnvironment, Upstream};
pub use guard::ReentrancyGuard;
pub use instances::InstanceRegistry;
pub use request::CreateRequest;
pub use traits::{CloningPrimitive, InitArgs, InitializerCall, InstanceRuntime};
pub use whitelist::TemplateWhitelist;

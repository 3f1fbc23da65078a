use keystone_types::{Address, PriceConfig};
use serde::{Deserialize, Serialize};

/// Notifications the factory emits, in the order they happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FactoryEvent {
    TemplateWhitelisted {
        template: Address,
        price: PriceConfig,
    },
    TemplateRemoved {
        template: Address,
    },
    ClonePriceUpdated {
        template: Address,
        price: PriceConfig,
    },
    InstanceCreated {
        template: Address,
        instance: Address,
        owner: Address,
        instance_count: usize,
    },
    EventForwarderUpdated {
        forwarder: Option<Address>,
    },
}

use keystone_types::{signatures, Address, OperationType, Selector, TxParams};
use serde::{Deserialize, Serialize};

use crate::definitions::CLONE_OPERATION;
use crate::error::FactoryError;

/// Arguments of `create`, as captured in a guarded operation's execution params.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub template: Address,
    pub owner: Address,
    pub broadcaster: Address,
    pub recovery: Address,
    pub time_lock_period: u64,
    #[serde(default)]
    pub init_data: Vec<u8>,
}

impl CreateRequest {
    pub fn new(template: Address, owner: Address, broadcaster: Address, recovery: Address) -> Self {
        Self {
            template,
            owner,
            broadcaster,
            recovery,
            time_lock_period: 0,
            init_data: Vec::new(),
        }
    }

    pub fn with_time_lock(mut self, seconds: u64) -> Self {
        self.time_lock_period = seconds;
        self
    }

    pub fn with_init_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.init_data = data.into();
        self
    }

    pub fn selector() -> Selector {
        Selector::from_signature(signatures::CREATE)
    }

    pub fn encode(&self) -> Result<Vec<u8>, FactoryError> {
        serde_json::to_vec(self).map_err(|e| FactoryError::MalformedParams(e.to_string()))
    }

    pub fn decode(params: &[u8]) -> Result<Self, FactoryError> {
        serde_json::from_slice(params).map_err(|e| FactoryError::MalformedParams(e.to_string()))
    }

    /// The call a requester submits to the execution engine for this creation.
    pub fn to_tx_params(
        &self,
        requester: Address,
        factory: Address,
        value: u128,
    ) -> Result<TxParams, FactoryError> {
        Ok(TxParams {
            requester,
            target: factory,
            value,
            operation_type: OperationType::new(CLONE_OPERATION),
            execution_selector: Self::selector(),
            execution_params: self.encode()?,
        })
    }
}

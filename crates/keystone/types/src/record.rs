use serde::{Deserialize, Serialize};

use crate::ids::{Address, OperationType, Selector};
use crate::payment::PaymentDetails;

/// Status of a transaction record held by the execution engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    #[default]
    Undefined,
    Pending,
    Executing,
    ProcessingPayment,
    Cancelled,
    Completed,
    Failed,
    Rejected,
}

impl TxStatus {
    /// True for states the engine never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TxStatus::Cancelled | TxStatus::Completed | TxStatus::Failed | TxStatus::Rejected
        )
    }
}

/// The call a transaction record will execute, as captured at request time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxParams {
    pub requester: Address,
    pub target: Address,
    pub value: u128,
    pub operation_type: OperationType,
    pub execution_selector: Selector,
    /// Encoded arguments of the call, opaque to the engine.
    pub execution_params: Vec<u8>,
}

/// A transaction record as seen by post-completion hooks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    pub tx_id: u64,
    pub status: TxStatus,
    pub params: TxParams,
    /// Payment the requester declared when the operation was first requested.
    pub payment: PaymentDetails,
}

/// Lifecycle notification an instance reports to its event sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub tx_id: u64,
    pub selector: Selector,
    pub status: TxStatus,
    pub requester: Address,
    pub target: Address,
    pub operation_type: OperationType,
}

impl LifecycleEvent {
    pub fn from_record(record: &TxRecord) -> Self {
        Self {
            tx_id: record.tx_id,
            selector: record.params.execution_selector,
            status: record.status,
            requester: record.params.requester,
            target: record.params.target,
            operation_type: record.params.operation_type.clone(),
        }
    }
}

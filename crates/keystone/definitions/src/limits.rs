//! Bounds on definition batches.

use serde::{Deserialize, Serialize};

use crate::error::{BatchKind, DefinitionError, Result};

/// Maximum sizes of one definition batch. A provider's outputs are bounded by
/// the same numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionLimits {
    /// Maximum operation schemas per load
    #[serde(default = "default_max_schemas")]
    pub max_schemas: usize,

    /// Maximum role permissions per load
    #[serde(default = "default_max_permissions")]
    pub max_permissions: usize,
}

impl Default for DefinitionLimits {
    fn default() -> Self {
        Self {
            max_schemas: default_max_schemas(),
            max_permissions: default_max_permissions(),
        }
    }
}

fn default_max_schemas() -> usize {
    100
}

fn default_max_permissions() -> usize {
    100
}

impl DefinitionLimits {
    pub fn check(&self, kind: BatchKind, actual: usize) -> Result<()> {
        let max = match kind {
            BatchKind::Schemas => self.max_schemas,
            BatchKind::Permissions => self.max_permissions,
        };
        if actual > max {
            return Err(DefinitionError::BatchSizeExceeded { kind, actual, max });
        }
        Ok(())
    }
}

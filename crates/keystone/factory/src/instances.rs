use std::collections::HashSet;

use keystone_types::Address;

use crate::error::FactoryError;

/// Append-only registry of instances this factory created.
#[derive(Clone, Debug, Default)]
pub struct InstanceRegistry {
    order: Vec<Address>,
    members: HashSet<Address>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new instance; returns the instance count afterwards.
    pub fn append(&mut self, instance: Address) -> usize {
        if self.members.insert(instance) {
            self.order.push(instance);
        }
        self.order.len()
    }

    pub fn contains(&self, instance: &Address) -> bool {
        self.members.contains(instance)
    }

    pub fn at(&self, index: usize) -> Result<Address, FactoryError> {
        self.order
            .get(index)
            .copied()
            .ok_or(FactoryError::IndexOutOfBounds {
                index,
                len: self.order.len(),
            })
    }

    pub fn all(&self) -> &[Address] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

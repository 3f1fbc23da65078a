use std::collections::HashMap;

use keystone_types::{Address, PriceConfig};

use crate::error::FactoryError;

/// Trusted templates and their clone prices.
///
/// Enumerable by index. Removal swaps the last entry into the vacated slot,
/// so indices are only stable between removals. A template has a price
/// exactly while it is whitelisted.
#[derive(Clone, Debug, Default)]
pub struct TemplateWhitelist {
    order: Vec<Address>,
    entries: HashMap<Address, (usize, PriceConfig)>,
}

impl TemplateWhitelist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false`, leaving the existing price alone, if already present.
    pub fn insert(&mut self, template: Address, price: PriceConfig) -> bool {
        if self.entries.contains_key(&template) {
            return false;
        }
        self.entries.insert(template, (self.order.len(), price));
        self.order.push(template);
        true
    }

    /// Removes the template and its price. Returns `false` if absent.
    pub fn remove(&mut self, template: &Address) -> bool {
        let Some((index, _)) = self.entries.remove(template) else {
            return false;
        };
        self.order.swap_remove(index);
        if let Some(moved) = self.order.get(index) {
            if let Some(entry) = self.entries.get_mut(moved) {
                entry.0 = index;
            }
        }
        true
    }

    /// Replace the price of a whitelisted template.
    pub fn set_price(&mut self, template: &Address, price: PriceConfig) -> Result<(), FactoryError> {
        let entry = self
            .entries
            .get_mut(template)
            .ok_or(FactoryError::NotWhitelisted(*template))?;
        entry.1 = price;
        Ok(())
    }

    pub fn contains(&self, template: &Address) -> bool {
        self.entries.contains_key(template)
    }

    /// Configured price, or the zero price when not whitelisted.
    pub fn price(&self, template: &Address) -> PriceConfig {
        self.entries
            .get(template)
            .map(|(_, price)| *price)
            .unwrap_or_default()
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

    pub fn templates(&self) -> &[Address] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

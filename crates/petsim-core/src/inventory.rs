//! Counted item stock used by fulfillment methods with a cost.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use petsim_logic::need::Inventory;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pantry {
    stock: BTreeMap<String, u32>,
}

impl Pantry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(mut self, item: impl Into<String>, quantity: u32) -> Self {
        self.add(item, quantity);
        self
    }

    pub fn add(&mut self, item: impl Into<String>, quantity: u32) {
        *self.stock.entry(item.into()).or_insert(0) += quantity;
    }

    pub fn count(&self, item: &str) -> u32 {
        self.stock.get(item).copied().unwrap_or(0)
    }
}

impl Inventory for Pantry {
    fn has(&self, item: &str, quantity: u32) -> bool {
        self.count(item) >= quantity
    }

    fn consume(&mut self, item: &str, quantity: u32) -> bool {
        match self.stock.get_mut(item) {
            Some(n) if *n >= quantity => {
                *n -= quantity;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_respects_stock() {
        let mut pantry = Pantry::new().with_stock("kibble", 2);
        assert!(pantry.has("kibble", 2));
        assert!(pantry.consume("kibble", 1));
        assert!(!pantry.has("kibble", 2));
        assert!(!pantry.consume("kibble", 2));
        assert_eq!(pantry.count("kibble"), 1);
        assert!(!pantry.consume("treat", 1));
    }

    #[test]
    fn test_pantry_from_json() {
        let pantry: Pantry = serde_json::from_str(r#"{ "stock": { "treat": 3 } }"#).unwrap();
        assert_eq!(pantry.count("treat"), 3);
    }
}

//! Need registry: every need entity the runtime knows about, keyed by id.
//!
//! The scheduler and the autonomy engine receive the registry explicitly;
//! nothing looks needs up through global state. Declaration order is kept
//! and doubles as the tie order for the urgency ranking.

use petsim_logic::constants::limits;
use petsim_logic::need::{DegradationPolicy, NeedDescriptor, NeedEntity};

use crate::error::PetError;

/// Built-in pet: hunger, thirst, sleep, cleanliness, fun, affection, coziness.
pub const DEFAULT_NEEDS_JSON: &str = include_str!("../data/needs.json");

#[derive(Debug, Clone, Default)]
pub struct NeedRegistry {
    needs: Vec<NeedEntity>,
}

impl NeedRegistry {
    /// Validate descriptors and build one entity per descriptor.
    pub fn from_descriptors(descriptors: Vec<NeedDescriptor>) -> Result<Self, PetError> {
        let mut needs: Vec<NeedEntity> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            validate(&descriptor)?;
            if needs.iter().any(|n| n.id() == descriptor.id) {
                return Err(invalid(&descriptor.id, "duplicate need id"));
            }
            needs.push(NeedEntity::new(descriptor));
        }
        log::debug!("Need registry built with {} needs", needs.len());
        Ok(Self { needs })
    }

    /// Parse a JSON array of descriptors.
    pub fn from_json(json: &str) -> Result<Self, PetError> {
        let descriptors: Vec<NeedDescriptor> = serde_json::from_str(json)?;
        Self::from_descriptors(descriptors)
    }

    /// Registry built from the embedded need catalog.
    pub fn builtin() -> Result<Self, PetError> {
        Self::from_json(DEFAULT_NEEDS_JSON)
    }

    pub fn get(&self, id: &str) -> Option<&NeedEntity> {
        self.needs.iter().find(|n| n.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut NeedEntity> {
        self.needs.iter_mut().find(|n| n.id() == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.needs.iter().position(|n| n.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NeedEntity> {
        self.needs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NeedEntity> {
        self.needs.iter_mut()
    }

    /// Ids in declaration order.
    pub fn ids(&self) -> Vec<String> {
        self.needs.iter().map(|n| n.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.needs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.needs.is_empty()
    }

    /// Rebuild every entity from its descriptor (initial value, status memory).
    pub fn reset(&mut self) {
        for need in self.needs.iter_mut() {
            *need = NeedEntity::new(need.descriptor().clone());
        }
    }
}

fn invalid(need: &str, reason: &str) -> PetError {
    PetError::InvalidDescriptor {
        need: need.to_string(),
        reason: reason.to_string(),
    }
}

fn validate(d: &NeedDescriptor) -> Result<(), PetError> {
    if d.id.is_empty() {
        return Err(invalid("<unnamed>", "id must not be empty"));
    }
    if !d.thresholds.is_monotonic() {
        return Err(invalid(&d.id, "thresholds must satisfy 0 < urgent < normal < fulfilled <= 100"));
    }
    if !(limits::MIN_VALUE..=limits::MAX_VALUE).contains(&d.initial) {
        return Err(invalid(&d.id, "initial value out of range"));
    }
    if matches!(d.degradation, DegradationPolicy::Linear { rate_per_sec } if rate_per_sec < 0.0) {
        return Err(invalid(&d.id, "degradation rate must be non-negative"));
    }
    if d.methods.iter().any(|m| m.improvement < 0.0) {
        return Err(invalid(&d.id, "method improvement must be non-negative"));
    }
    if let Some(movement) = &d.movement {
        if !(limits::MIN_VALUE..=limits::MAX_VALUE).contains(&movement.threshold) {
            return Err(invalid(&d.id, "movement threshold out of range"));
        }
        if !d.methods.iter().any(|m| m.id == movement.method) {
            return Err(invalid(&d.id, "movement method is not declared"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use petsim_logic::constants::need_ids;
    use petsim_logic::status::{Status, StatusThresholds};

    #[test]
    fn test_builtin_registry_loads() {
        let registry = NeedRegistry::builtin().unwrap();
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.index_of(need_ids::HUNGER), Some(0));
        let hunger = registry.get(need_ids::HUNGER).unwrap();
        assert_eq!(hunger.value(), 80.0);
        assert_eq!(hunger.status(), Status::Normal);
        let cleanliness = registry.get(need_ids::CLEANLINESS).unwrap();
        assert!(cleanliness.is_event_driven());
        assert!(registry.get("boredom").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = NeedRegistry::from_descriptors(vec![
            NeedDescriptor::linear("hunger", 0.1),
            NeedDescriptor::linear("hunger", 0.2),
        ])
        .unwrap_err();
        assert!(matches!(err, PetError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_bad_thresholds_rejected() {
        let mut d = NeedDescriptor::linear("fun", 0.1);
        d.thresholds = StatusThresholds {
            fulfilled: 60.0,
            normal: 70.0,
            urgent: 50.0,
        };
        assert!(NeedRegistry::from_descriptors(vec![d]).is_err());
    }

    #[test]
    fn test_negative_rate_and_initial_rejected() {
        assert!(NeedRegistry::from_descriptors(vec![NeedDescriptor::linear("a", -1.0)]).is_err());
        let d = NeedDescriptor::linear("b", 0.1).with_initial(140.0);
        assert!(NeedRegistry::from_descriptors(vec![d]).is_err());
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = NeedRegistry::from_json("[{ \"id\": 3 }]").unwrap_err();
        assert!(matches!(err, PetError::Config(_)));
    }

    #[test]
    fn test_reset_restores_initial_values() {
        let mut registry = NeedRegistry::builtin().unwrap();
        registry.get_mut(need_ids::FUN).unwrap().degrade_by(60.0);
        assert_eq!(registry.get(need_ids::FUN).unwrap().value(), 20.0);
        registry.reset();
        assert_eq!(registry.get(need_ids::FUN).unwrap().value(), 80.0);
        assert_eq!(registry.ids()[0], need_ids::HUNGER);
    }
}

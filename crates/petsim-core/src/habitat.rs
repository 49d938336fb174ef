//! Habitat collaborator: where the pet, its items and its waste live.
//!
//! [`GridHabitat`] is the reference implementation. It keeps the pet, items
//! and waste piles as entities in a `hecs` world on a bounded grid.

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use petsim_logic::autonomy::ItemRef;
use petsim_logic::grid::GridPos;

/// The pet's surroundings, as seen by the scheduler and autonomy engine.
pub trait Habitat {
    /// `None` when no pet has been placed.
    fn agent_position(&self) -> Option<GridPos>;
    fn set_agent_position(&mut self, pos: GridPos);
    /// Every item on the grid, ordered by id.
    fn items(&self) -> Vec<ItemRef>;
    /// Returns false if the item was already gone.
    fn remove_item(&mut self, id: u64) -> bool;
    fn item_count(&self, kind: &str) -> u32;
    fn waste_count(&self) -> u32;
    fn spawn_waste(&mut self, pos: GridPos);
    /// Remove every waste pile. Returns how many were removed.
    fn clear_waste(&mut self) -> u32;
}

/// Marker for the pet entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub kind: String,
    pub quality: i32,
}

/// Stable id handed out to callers; entity handles stay internal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Marker for a waste pile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waste;

pub struct GridHabitat {
    pub world: World,
    width: i32,
    height: i32,
    pet: Option<Entity>,
    next_item_id: u64,
}

impl GridHabitat {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            world: World::new(),
            width: width.max(1),
            height: height.max(1),
            pet: None,
            next_item_id: 0,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Place the pet, moving it if it already exists.
    pub fn spawn_pet(&mut self, pos: GridPos) {
        let pos = pos.clamp_to(self.width, self.height);
        match self.pet {
            Some(_) => self.set_agent_position(pos),
            None => self.pet = Some(self.world.spawn((Pet, pos))),
        }
    }

    /// Put an item on the grid and return its id.
    pub fn place_item(&mut self, kind: impl Into<String>, quality: i32, pos: GridPos) -> u64 {
        self.next_item_id += 1;
        let id = self.next_item_id;
        let item = Item {
            kind: kind.into(),
            quality,
        };
        self.world
            .spawn((item, ItemId(id), pos.clamp_to(self.width, self.height)));
        id
    }

    pub fn item_total(&self) -> usize {
        self.world.query::<&Item>().iter().count()
    }

    fn find_item(&self, id: u64) -> Option<Entity> {
        self.world
            .query::<&ItemId>()
            .iter()
            .find(|(_, item_id)| item_id.0 == id)
            .map(|(entity, _)| entity)
    }
}

impl Habitat for GridHabitat {
    fn agent_position(&self) -> Option<GridPos> {
        let pet = self.pet?;
        self.world.get::<&GridPos>(pet).ok().map(|pos| *pos)
    }

    fn set_agent_position(&mut self, pos: GridPos) {
        let pos = pos.clamp_to(self.width, self.height);
        if let Some(pet) = self.pet {
            if let Ok(mut current) = self.world.get::<&mut GridPos>(pet) {
                *current = pos;
            }
        }
    }

    fn items(&self) -> Vec<ItemRef> {
        let mut items: Vec<ItemRef> = self
            .world
            .query::<(&Item, &ItemId, &GridPos)>()
            .iter()
            .map(|(_, (item, id, pos))| ItemRef {
                id: id.0,
                kind: item.kind.clone(),
                position: *pos,
                quality: item.quality,
            })
            .collect();
        items.sort_by_key(|item| item.id);
        items
    }

    fn remove_item(&mut self, id: u64) -> bool {
        match self.find_item(id) {
            Some(entity) => self.world.despawn(entity).is_ok(),
            None => false,
        }
    }

    fn item_count(&self, kind: &str) -> u32 {
        self.world
            .query::<&Item>()
            .iter()
            .filter(|(_, item)| item.kind == kind)
            .count() as u32
    }

    fn waste_count(&self) -> u32 {
        self.world.query::<&Waste>().iter().count() as u32
    }

    fn spawn_waste(&mut self, pos: GridPos) {
        self.world
            .spawn((Waste, pos.clamp_to(self.width, self.height)));
    }

    fn clear_waste(&mut self) -> u32 {
        let piles: Vec<Entity> = self
            .world
            .query::<&Waste>()
            .iter()
            .map(|(entity, _)| entity)
            .collect();
        let mut removed = 0;
        for entity in piles {
            if self.world.despawn(entity).is_ok() {
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pet_position_roundtrip() {
        let mut habitat = GridHabitat::new(12, 8);
        assert!(habitat.agent_position().is_none());
        habitat.spawn_pet(GridPos::new(3, 3));
        assert_eq!(habitat.agent_position(), Some(GridPos::new(3, 3)));
        habitat.set_agent_position(GridPos::new(40, -2));
        assert_eq!(habitat.agent_position(), Some(GridPos::new(11, 0)));
        habitat.spawn_pet(GridPos::new(1, 1));
        assert_eq!(habitat.agent_position(), Some(GridPos::new(1, 1)));
        assert_eq!(habitat.world.query::<&Pet>().iter().count(), 1);
    }

    #[test]
    fn test_items_sorted_and_removable() {
        let mut habitat = GridHabitat::new(12, 8);
        let a = habitat.place_item("apple", 60, GridPos::new(2, 2));
        let b = habitat.place_item("ball", 50, GridPos::new(4, 1));
        let c = habitat.place_item("apple", 70, GridPos::new(5, 5));
        let ids: Vec<u64> = habitat.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![a, b, c]);
        assert_eq!(habitat.item_count("apple"), 2);

        assert!(habitat.remove_item(a));
        assert!(!habitat.remove_item(a));
        assert_eq!(habitat.item_count("apple"), 1);
        assert_eq!(habitat.item_total(), 2);
    }

    #[test]
    fn test_waste_spawn_and_clear() {
        let mut habitat = GridHabitat::new(4, 4);
        habitat.spawn_waste(GridPos::new(1, 1));
        habitat.spawn_waste(GridPos::new(9, 9));
        assert_eq!(habitat.waste_count(), 2);
        assert_eq!(habitat.clear_waste(), 2);
        assert_eq!(habitat.waste_count(), 0);
        assert_eq!(habitat.clear_waste(), 0);
    }
}

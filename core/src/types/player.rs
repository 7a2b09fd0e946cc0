//! The player character entity: the in-world avatar of one authenticated session.

use super::buff::Buff;
use super::item::{ItemInstance, ItemLocation};
use crate::constants::INVENTORY_SLOTS;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: u64,
    pub account_id: u64,
    pub name: String,
    pub map: u16,
    pub x: i32,
    pub y: i32,
    pub heading: u8,
    pub level: u32,
    pub experience: u64,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub alignment: i32,
    pub pk_count: u32,
    pub buffs: Vec<Buff>,
    pub known_spells: Vec<u32>,
    pub bookmarks: Vec<(u16, i32, i32)>,
    pub clan_id: Option<u64>,
    pub party_id: Option<u64>,
    /// Ordered inventory slots; an equipped item keeps its slot but carries
    /// `ItemFlags`-style equipped bit in `ItemInstance::flags`.
    pub inventory: Vec<ItemInstance>,
}

impl Player {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn apply_damage(&mut self, amount: i32) {
        self.hp = (self.hp - amount.max(0)).max(0);
    }

    pub fn heal(&mut self, amount: i32) {
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
    }

    /// Lowest free inventory slot, or `None` if every slot up to
    /// [`INVENTORY_SLOTS`] is occupied.
    pub fn next_free_slot(&self) -> Option<u8> {
        let taken: std::collections::HashSet<u8> = self
            .inventory
            .iter()
            .filter_map(|item| match item.location {
                ItemLocation::Inventory { slot, .. } => Some(slot),
                _ => None,
            })
            .collect();
        (0..INVENTORY_SLOTS).find(|slot| !taken.contains(slot))
    }

    pub fn inventory_item(&self, item_id: u64) -> Option<&ItemInstance> {
        self.inventory.iter().find(|item| item.id == item_id)
    }

    pub fn remove_from_inventory(&mut self, item_id: u64) -> Option<ItemInstance> {
        let idx = self.inventory.iter().position(|item| item.id == item_id)?;
        Some(self.inventory.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player {
            id: 1,
            account_id: 1,
            name: "tester".into(),
            map: 0,
            x: 0,
            y: 0,
            heading: 0,
            level: 1,
            experience: 0,
            hp: 50,
            max_hp: 50,
            mp: 10,
            max_mp: 10,
            alignment: 0,
            pk_count: 0,
            buffs: Vec::new(),
            known_spells: Vec::new(),
            bookmarks: Vec::new(),
            clan_id: None,
            party_id: None,
            inventory: Vec::new(),
        }
    }

    #[test]
    fn damage_and_heal_clamp_to_bounds() {
        let mut p = player();
        p.apply_damage(1000);
        assert_eq!(p.hp, 0);
        assert!(!p.is_alive());
        p.heal(1000);
        assert_eq!(p.hp, p.max_hp);
    }

    fn item(id: u64, slot: u8) -> ItemInstance {
        ItemInstance {
            id,
            template_id: 1,
            count: 1,
            enchant: 0,
            flags: 0,
            location: ItemLocation::Inventory { owner_id: 1, slot },
        }
    }

    #[test]
    fn next_free_slot_skips_occupied_slots() {
        let mut p = player();
        p.inventory.push(item(1, 0));
        p.inventory.push(item(2, 1));
        assert_eq!(p.next_free_slot(), Some(2));
    }

    #[test]
    fn remove_from_inventory_returns_the_removed_item() {
        let mut p = player();
        p.inventory.push(item(1, 0));
        let removed = p.remove_from_inventory(1).unwrap();
        assert_eq!(removed.id, 1);
        assert!(p.inventory_item(1).is_none());
    }
}

//! Item instances: inventory-held, worn, warehouse-held, or lying on the ground.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemLocation {
    Inventory { owner_id: u64, slot: u8 },
    Worn { owner_id: u64, slot: u8 },
    Warehouse { clan_id: u64 },
    Ground { map: u16, x: i32, y: i32 },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemInstance {
    pub id: u64,
    pub template_id: u32,
    pub count: u32,
    pub enchant: i16,
    pub flags: u32,
    pub location: ItemLocation,
}

impl ItemInstance {
    pub fn is_stackable_with(&self, other: &ItemInstance) -> bool {
        self.template_id == other.template_id && self.enchant == other.enchant
    }
}

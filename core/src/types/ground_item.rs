//! An item instance lying on the ground with a time-to-live before despawn.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroundItem {
    pub id: u64,
    pub template_id: u32,
    pub count: u32,
    pub map: u16,
    pub x: i32,
    pub y: i32,
    /// Set on drop to the dropping player; pickup is restricted to the
    /// owner until [`GroundItem::is_owner_protected`] lapses.
    pub owner_id: Option<u64>,
    pub dropped_at_tick: u64,
    pub expires_at_tick: u64,
}

impl GroundItem {
    pub fn is_expired(&self, current_tick: u64) -> bool {
        current_tick >= self.expires_at_tick
    }

    /// True while pickup is still restricted to `owner_id`, i.e. within
    /// `protection_ticks` of the drop.
    pub fn is_owner_protected(&self, current_tick: u64, protection_ticks: u64) -> bool {
        self.owner_id.is_some() && current_tick < self.dropped_at_tick + protection_ticks
    }

    pub fn can_be_picked_up_by(&self, picker_id: u64, current_tick: u64, protection_ticks: u64) -> bool {
        match self.owner_id {
            Some(owner) if self.is_owner_protected(current_tick, protection_ticks) => owner == picker_id,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(owner_id: Option<u64>, dropped_at_tick: u64) -> GroundItem {
        GroundItem {
            id: 1,
            template_id: 10,
            count: 1,
            map: 0,
            x: 0,
            y: 0,
            owner_id,
            dropped_at_tick,
            expires_at_tick: dropped_at_tick + 100,
        }
    }

    #[test]
    fn expires_at_boundary_tick() {
        let g = item(None, 0);
        assert!(!g.is_expired(99));
        assert!(g.is_expired(100));
    }

    #[test]
    fn owner_protection_lapses_after_window() {
        let g = item(Some(1), 0);
        assert!(!g.can_be_picked_up_by(2, 0, 10));
        assert!(g.can_be_picked_up_by(1, 0, 10));
        assert!(g.can_be_picked_up_by(2, 10, 10));
    }

    #[test]
    fn unowned_item_has_no_restriction() {
        let g = item(None, 0);
        assert!(g.can_be_picked_up_by(99, 0, 10));
    }
}

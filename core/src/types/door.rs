//! Doors: static, openable tile-occupancy obstacles.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Door {
    pub id: u64,
    pub map: u16,
    pub x: i32,
    pub y: i32,
    pub is_open: bool,
    pub locked: bool,
    pub key_template_id: Option<u32>,
}

impl Door {
    pub fn blocks_movement(&self) -> bool {
        !self.is_open
    }

    pub fn can_open_with(&self, held_template_id: Option<u32>) -> bool {
        if !self.locked {
            return true;
        }
        match (self.key_template_id, held_template_id) {
            (Some(req), Some(held)) => req == held,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_door_blocks_movement() {
        let d = Door {
            id: 1,
            map: 0,
            x: 0,
            y: 0,
            is_open: false,
            locked: false,
            key_template_id: None,
        };
        assert!(d.blocks_movement());
    }

    #[test]
    fn locked_door_requires_matching_key() {
        let d = Door {
            id: 1,
            map: 0,
            x: 0,
            y: 0,
            is_open: false,
            locked: true,
            key_template_id: Some(5),
        };
        assert!(!d.can_open_with(None));
        assert!(!d.can_open_with(Some(6)));
        assert!(d.can_open_with(Some(5)));
    }
}

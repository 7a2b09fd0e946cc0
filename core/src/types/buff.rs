//! Active time-limited stat/status modifiers.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuffKind {
    StatModifier,
    DamageOverTime,
    HealOverTime,
    Stun,
    Poison,
    Shield,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Buff {
    pub kind: BuffKind,
    /// Opaque magnitude, interpreted by the system that applies this buff kind.
    pub magnitude: i32,
    pub ticks_remaining: u32,
    pub source_id: u64,
}

impl Buff {
    pub fn is_expired(&self) -> bool {
        self.ticks_remaining == 0
    }

    pub fn tick(&mut self) {
        if self.ticks_remaining > 0 {
            self.ticks_remaining -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_counts_down_and_expires() {
        let mut b = Buff {
            kind: BuffKind::Poison,
            magnitude: 3,
            ticks_remaining: 2,
            source_id: 1,
        };
        assert!(!b.is_expired());
        b.tick();
        assert!(!b.is_expired());
        b.tick();
        assert!(b.is_expired());
        b.tick();
        assert_eq!(b.ticks_remaining, 0);
    }
}

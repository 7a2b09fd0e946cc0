//! Phase 3 (PostUpdate): rolls a new weather state once per in-world hour
//! and publishes it for `OutputSystem` to broadcast. The roll itself is a
//! flat weighted pick (60% clear, 20% snow, 20% rain), not script-driven —
//! weather has no gameplay hook to delegate to, unlike NPC behavior.

use core::constants::TICKS_PER_GAME_HOUR;

use crate::event_bus::{self, GameEvent, Weather};
use crate::tick::{Phase, System};
use rand::Rng;

pub struct WeatherSystem {
    last_hour: u64,
}

impl WeatherSystem {
    pub fn new() -> Self {
        Self { last_hour: u64::MAX }
    }

    fn roll() -> Weather {
        let mut rng = rand::thread_rng();
        match rng.gen_range(0..100) {
            0..=59 => Weather::Clear,
            60..=79 => Weather::Snow(rng.gen_range(1..=3)),
            _ => Weather::Rain(rng.gen_range(17..=19)),
        }
    }
}

impl Default for WeatherSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for WeatherSystem {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn phase(&self) -> Phase {
        Phase::PostUpdate
    }

    fn run(&mut self, current_tick: u64) {
        let hour = current_tick / TICKS_PER_GAME_HOUR;
        if hour == self.last_hour {
            return;
        }
        self.last_hour = hour;

        let weather = Self::roll();
        event_bus::with_mut(|events| events.publish(GameEvent::WeatherChanged { weather }));
    }
}

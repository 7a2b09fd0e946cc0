//! Canonical in-memory world state: the single owner of every live entity.
//!
//! Only the game-loop thread ever calls `with_mut`; session reader/writer
//! threads never touch this module directly, they hand packets to the loop
//! through the session queues instead. The singleton + closure-accessor
//! shape mirrors the teacher's own `Repository`/`Server::with_players`
//! pattern, generalized from a fixed `[ServerPlayer; MAXPLAYER]` array to
//! id-keyed maps over the generic entity model.

use core::ids::{EntityId, SlotAllocator};
use core::types::{Door, GroundItem, Npc, Player};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::spatial::{AoiGrid, OccupancyGrid};

pub struct WorldState {
    pub players: HashMap<u64, Player>,
    pub npcs: HashMap<u64, Npc>,
    pub doors: HashMap<u64, Door>,
    pub ground_items: HashMap<u64, GroundItem>,
    pub player_allocator: SlotAllocator,
    pub npc_allocator: SlotAllocator,
    pub player_aoi: AoiGrid,
    pub npc_aoi: AoiGrid,
    pub occupancy: OccupancyGrid,
    pub current_tick: u64,
}

impl WorldState {
    fn new() -> Self {
        Self {
            players: HashMap::new(),
            npcs: HashMap::new(),
            doors: HashMap::new(),
            ground_items: HashMap::new(),
            player_allocator: SlotAllocator::new(u16::MAX),
            npc_allocator: SlotAllocator::new(u16::MAX),
            player_aoi: AoiGrid::new(),
            npc_aoi: AoiGrid::new(),
            occupancy: OccupancyGrid::new(),
            current_tick: 0,
        }
    }

    pub fn insert_player(&mut self, player: Player) {
        self.player_aoi
            .insert(player.id, player.map, player.x, player.y);
        self.occupancy.try_occupy(player.id, player.map, player.x, player.y);
        self.players.insert(player.id, player);
    }

    pub fn remove_player(&mut self, id: u64) -> Option<Player> {
        self.player_aoi.remove(id);
        if let Some(p) = self.players.get(&id) {
            self.occupancy.vacate(p.map, p.x, p.y);
        }
        self.players.remove(&id)
    }

    pub fn move_player(&mut self, id: u64, map: u16, x: i32, y: i32) -> bool {
        let Some(player) = self.players.get(&id) else {
            return false;
        };
        let (old_map, old_x, old_y) = (player.map, player.x, player.y);
        if old_map == map && self.occupancy.occupant_at(map, x, y) == Some(id) {
            return true;
        }
        if self.occupancy.is_blocked(map, x, y) {
            return false;
        }
        self.occupancy.vacate(old_map, old_x, old_y);
        self.occupancy.try_occupy(id, map, x, y);
        self.player_aoi.relocate(id, map, x, y);
        if let Some(player) = self.players.get_mut(&id) {
            player.map = map;
            player.x = x;
            player.y = y;
        }
        true
    }
}

static WORLD: OnceLock<RwLock<WorldState>> = OnceLock::new();

fn global() -> &'static RwLock<WorldState> {
    WORLD.get_or_init(|| RwLock::new(WorldState::new()))
}

pub fn with<F, R>(f: F) -> R
where
    F: FnOnce(&WorldState) -> R,
{
    f(&global().read())
}

pub fn with_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut WorldState) -> R,
{
    f(&mut global().write())
}

/// Stable ordering helper used by systems that must iterate entities in a
/// deterministic order within a tick (e.g. combat resolution, NPC AI).
pub fn sorted_player_ids(state: &WorldState) -> Vec<u64> {
    let mut ids: Vec<u64> = state.players.keys().copied().collect();
    ids.sort_unstable();
    ids
}

#[allow(dead_code)]
fn _unused_entity_id_example() -> EntityId {
    EntityId::NONE
}

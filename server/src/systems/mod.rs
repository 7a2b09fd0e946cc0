//! Per-tick game logic, one module per system family, matching the
//! teacher's own split of combat/skill/item-use logic into a driver
//! submodule tree.

pub mod ai;
pub mod buffs;
pub mod combat;
pub mod cleanup;
pub mod companion_ai;
pub mod death;
pub mod event_dispatch;
pub mod ground_item;
pub mod input;
pub mod npc_respawn;
pub mod output;
pub mod party_refresh;
pub mod persistence;
pub mod polymorph;
pub mod regen;
pub mod skill;
pub mod summon;
pub mod visibility;
pub mod weather;

pub use ai::NpcAiSystem;
pub use buffs::BuffTickSystem;
pub use cleanup::CleanupSystem;
pub use combat::CombatSystem;
pub use companion_ai::CompanionAiSystem;
pub use death::DeathSystem;
pub use event_dispatch::EventDispatchSystem;
pub use ground_item::GroundItemSystem;
pub use input::InputSystem;
pub use npc_respawn::NpcRespawnSystem;
pub use output::OutputSystem;
pub use party_refresh::PartyRefreshSystem;
pub use persistence::PersistenceSystem;
pub use polymorph::PolymorphSystem;
pub use regen::RegenSystem;
pub use skill::SkillSystem;
pub use summon::SummonSystem;
pub use visibility::VisibilitySystem;
pub use weather::WeatherSystem;

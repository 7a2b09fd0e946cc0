//! Server library crate — the simulation engine, exposed as a library so
//! the `server` binary and its tests share one build of the game logic.

pub mod background_saver;
pub mod config;
pub mod dispatch;
pub mod enums;
pub mod event_bus;
pub mod handlers;
pub mod listener;
pub mod logging;
pub mod migrations;
pub mod path_finding;
pub mod repository;
pub mod script_bridge;
pub mod session;
pub mod spatial;
pub mod systems;
pub mod tick;
pub mod wal;
pub mod world;

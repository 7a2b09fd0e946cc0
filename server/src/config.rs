//! Typed server configuration.
//!
//! Loaded `default -> file -> environment`, mirroring the layering the
//! `config` crate encourages: built-in defaults, then an optional TOML file
//! (path from `MAG_CONFIG_PATH`, default `./server.conf`), then `MAG_`-
//! prefixed environment variables for per-field overrides. `.env` is loaded
//! first via `dotenvy` so local overrides don't require exporting shell vars.

use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Clone, Debug, Deserialize)]
pub struct ServerSection {
    pub bind_address: String,
    pub session_id_seed: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseSection {
    pub sqlite_path: String,
    pub pool_size: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NetworkSection {
    pub tick_ms: u64,
    pub input_poll_ms: u64,
    pub inbound_queue_len: usize,
    pub outbound_queue_len: usize,
    pub max_packets_per_tick: usize,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub party_refresh_ticks: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RatesSection {
    pub experience_multiplier: f64,
    pub drop_multiplier: f64,
    pub gold_multiplier: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EnchantSection {
    pub base_success_probability: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CharacterDefaultsSection {
    pub starting_map: u16,
    pub starting_x: i32,
    pub starting_y: i32,
    pub starting_hp: i32,
    pub starting_mp: i32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
    pub format: String,
    pub file: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RateLimitSection {
    pub enabled: bool,
    pub logins_per_minute: u32,
    pub packets_per_second: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScriptsSection {
    pub directory: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub network: NetworkSection,
    pub rates: RatesSection,
    pub enchant: EnchantSection,
    pub character_defaults: CharacterDefaultsSection,
    pub logging: LoggingSection,
    pub rate_limit: RateLimitSection,
    pub scripts: ScriptsSection,
}

impl Config {
    /// Loads configuration from defaults, an optional TOML file, and
    /// `MAG_`-prefixed environment variables, in that precedence order.
    pub fn load() -> Result<Self, core::GameError> {
        let _ = dotenvy::dotenv();

        let path =
            std::env::var("MAG_CONFIG_PATH").unwrap_or_else(|_| "./server.conf".to_string());

        let mut builder = config::Config::builder().add_source(config::Config::try_from(&default())
            .map_err(|e| core::GameError::Config(e.to_string()))?);

        if Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(&path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("MAG")
                .separator("__")
                .try_parsing(true),
        );

        let built = builder
            .build()
            .map_err(|e| core::GameError::Config(e.to_string()))?;

        built
            .try_deserialize()
            .map_err(|e| core::GameError::Config(e.to_string()))
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Publishes the loaded config as the process-wide instance handlers read
/// through [`get`]. Called once from `main` after [`Config::load`].
pub fn set(cfg: Config) {
    let _ = CONFIG.set(cfg);
}

/// The process-wide config. Panics if [`set`] hasn't run yet — every
/// handler runs after `main` has loaded and published it.
pub fn get() -> &'static Config {
    CONFIG.get().expect("config not initialized")
}

pub(crate) fn default() -> Config {
    Config {
        server: ServerSection {
            bind_address: "0.0.0.0:5555".into(),
            session_id_seed: 1,
        },
        database: DatabaseSection {
            sqlite_path: "./world.sqlite3".into(),
            pool_size: 4,
        },
        network: NetworkSection {
            tick_ms: core::constants::DEFAULT_TICK_MS,
            input_poll_ms: core::constants::DEFAULT_INPUT_POLL_MS,
            inbound_queue_len: core::constants::DEFAULT_INBOUND_QUEUE_LEN,
            outbound_queue_len: core::constants::DEFAULT_OUTBOUND_QUEUE_LEN,
            max_packets_per_tick: 32,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5_000,
            party_refresh_ticks: 10,
        },
        rates: RatesSection {
            experience_multiplier: 1.0,
            drop_multiplier: 1.0,
            gold_multiplier: 1.0,
        },
        enchant: EnchantSection {
            base_success_probability: 0.5,
        },
        character_defaults: CharacterDefaultsSection {
            starting_map: 0,
            starting_x: 512,
            starting_y: 512,
            starting_hp: 50,
            starting_mp: 10,
        },
        logging: LoggingSection {
            level: "info".into(),
            format: "plain".into(),
            file: "".into(),
        },
        rate_limit: RateLimitSection {
            enabled: true,
            logins_per_minute: 10,
            packets_per_second: 30,
        },
        scripts: ScriptsSection {
            directory: "./scripts".into(),
        },
    }
}

//! Logger installation for hosts that want to see the crate's log output.

use log::LevelFilter;
use std::env;
use std::str::FromStr;

/// Environment variable holding the log level (`off`, `error`, ..., `trace`)
pub const LOG_LEVEL_ENV: &str = "BLUESHMEM_LOG_LEVEL";

/// Level used when [LOG_LEVEL_ENV] is unset or unreadable
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

/// Parses a level name, falling back to [DEFAULT_LEVEL]
pub fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .map(|val| val.trim().to_lowercase())
        .and_then(|val| LevelFilter::from_str(&val).ok())
        .unwrap_or(DEFAULT_LEVEL)
}

/// Reads the level from [LOG_LEVEL_ENV]
pub fn level_from_env() -> LevelFilter {
    parse_level(env::var(LOG_LEVEL_ENV).ok().as_deref())
}

/// Installs `env_logger` at the level found in the environment.
///
/// Returns `false` if a logger was already installed, in which case the
/// existing one is kept.
pub fn init_from_env() -> bool {
    env_logger::Builder::new()
        .filter_level(level_from_env())
        .try_init()
        .is_ok()
}

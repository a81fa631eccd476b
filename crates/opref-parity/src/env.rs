use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

use log::warn;

pub const CONFIG_VAR: &str = "OPREF_PARITY_CONFIG";
pub const SEED_VAR: &str = "OPREF_PARITY_SEED";

/// Base seed when `OPREF_PARITY_SEED` is unset or unparsable.
pub const DEFAULT_SEED: u64 = 7;

static PARITY_SEED: OnceLock<u64> = OnceLock::new();

/// Accepts decimal or `0x`-prefixed hexadecimal.
pub fn parse_seed(value: &str) -> Option<u64> {
    let trimmed = value.trim();
    match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => trimmed.parse().ok(),
    }
}

/// Base seed for generated inputs, read once per process.
pub fn parity_seed() -> u64 {
    *PARITY_SEED.get_or_init(|| match env::var(SEED_VAR) {
        Ok(value) if !value.trim().is_empty() => parse_seed(&value).unwrap_or_else(|| {
            warn!("ignoring {SEED_VAR}={value:?}: not an integer, using {DEFAULT_SEED}");
            DEFAULT_SEED
        }),
        _ => DEFAULT_SEED,
    })
}

/// Tolerance override file named by `OPREF_PARITY_CONFIG`, if any.
pub fn config_path() -> Option<PathBuf> {
    env::var_os(CONFIG_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

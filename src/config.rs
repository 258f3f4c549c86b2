//! Runtime configuration.
//!
//! Values come from the process environment (after `.env` is loaded by the
//! binary). Anything missing or unparsable falls back to its default with a
//! warning, the same way `HOST`/`PORT` have always been read.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::warn;

use crate::blockchain::{DEFAULT_DIFFICULTY, DIFF_MAX, DIFF_MIN};

/// How a persisted chain is trusted when it is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// Recompute every hash and Merkle root; refuse a broken chain.
    #[default]
    Verified,
    /// Restore stored hashes and roots verbatim.
    Trusted,
}

impl FromStr for LoadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verified" => Ok(Self::Verified),
            "trusted" => Ok(Self::Trusted),
            other => Err(format!("unknown load mode {other:?}")),
        }
    }
}

/// Where a submission is checked for an existing (student, course) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DedupScope {
    /// Pending pool only; a mined certificate may be issued again.
    #[default]
    Pending,
    /// Pending pool and every mined block.
    Chain,
}

impl FromStr for DedupScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "chain" => Ok(Self::Chain),
            other => Err(format!("unknown dedup scope {other:?}")),
        }
    }
}

/// Settings owned by the ledger itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub difficulty: u32,
    pub load_mode: LoadMode,
    pub dedup_scope: DedupScope,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            load_mode: LoadMode::default(),
            dedup_scope: DedupScope::default(),
        }
    }
}

/// Everything the HTTP shell needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub chain_file: PathBuf,
    /// Directory that chain exports and proof files are written into.
    pub export_dir: PathBuf,
    /// `None` lets mining run until it finds a nonce.
    pub mining_timeout: Option<Duration>,
    pub ledger: LedgerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            chain_file: PathBuf::from("chain.json"),
            export_dir: PathBuf::from("exports"),
            mining_timeout: None,
            ledger: LedgerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let difficulty: u32 = parse_or(&lookup, "DIFFICULTY", defaults.ledger.difficulty);
        let clamped = difficulty.clamp(DIFF_MIN, DIFF_MAX);
        if clamped != difficulty {
            warn!("DIFFICULTY={difficulty} out of range {DIFF_MIN}..={DIFF_MAX}, using {clamped}");
        }

        let timeout_secs: u64 = parse_or(&lookup, "MINING_TIMEOUT_SECS", 0);

        Self {
            host: lookup("HOST")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            chain_file: lookup("CHAIN_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.chain_file),
            export_dir: lookup("EXPORT_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
            mining_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            ledger: LedgerConfig {
                difficulty: clamped,
                load_mode: parse_or(&lookup, "LOAD_MODE", defaults.ledger.load_mode),
                dedup_scope: parse_or(&lookup, "DEDUP_SCOPE", defaults.ledger.dedup_scope),
            },
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) if raw.trim().is_empty() => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("ignoring invalid {key}={raw:?}: {e}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(config(&[]), ServerConfig::default());
        assert_eq!(ServerConfig::default().ledger.difficulty, 3);
    }

    #[test]
    fn values_are_read_from_lookup() {
        let cfg = config(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("CHAIN_FILE", "/tmp/certs.json"),
            ("DIFFICULTY", "4"),
            ("LOAD_MODE", "Trusted"),
            ("DEDUP_SCOPE", "chain"),
            ("MINING_TIMEOUT_SECS", "30"),
            ("EXPORT_DIR", "/srv/exports"),
        ]);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.chain_file, PathBuf::from("/tmp/certs.json"));
        assert_eq!(cfg.ledger.difficulty, 4);
        assert_eq!(cfg.ledger.load_mode, LoadMode::Trusted);
        assert_eq!(cfg.ledger.dedup_scope, DedupScope::Chain);
        assert_eq!(cfg.mining_timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.export_dir, PathBuf::from("/srv/exports"));
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = config(&[
            ("PORT", "not-a-port"),
            ("LOAD_MODE", "sometimes"),
            ("MINING_TIMEOUT_SECS", "-1"),
        ]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.ledger.load_mode, LoadMode::Verified);
        assert_eq!(cfg.mining_timeout, None);
    }

    #[test]
    fn difficulty_is_clamped() {
        assert_eq!(config(&[("DIFFICULTY", "0")]).ledger.difficulty, DIFF_MIN);
        assert_eq!(config(&[("DIFFICULTY", "12")]).ledger.difficulty, DIFF_MAX);
    }
}

//! TOML configuration for the `fcache` command.
//!
//! Every section is optional. A missing file, section or key falls back to
//! the defaults below, and the accessor methods on [`CliConfig`] return the
//! effective values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Shard topology and router.
    pub topology: TopologySection,
    /// Location hint store.
    pub hints: HintsSection,
    /// Rows to load into the in-memory shards.
    pub dataset: DatasetSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[topology]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TopologySection {
    /// Router kind: `"modulo"` (default) or `"ring"`.
    pub router: Option<String>,
    /// Number of shards, numbered `0..shards`.
    pub shards: Option<u32>,
    /// Virtual nodes per shard (ring router only).
    pub vnodes_per_shard: Option<u16>,
}

/// `[hints]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HintsSection {
    /// Backend: `"memory"` (default), `"file"` or `"none"`.
    pub backend: Option<String>,
    /// Maximum number of hints held by the memory backend.
    pub capacity: Option<usize>,
    /// Directory of the file backend.
    pub path: Option<PathBuf>,
}

/// `[dataset]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatasetSection {
    /// TOML file with `[[rows]]` tables. No file means empty shards.
    pub path: Option<PathBuf>,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Which [`ShardRouter`](filecache_route::ShardRouter) to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterKind {
    Modulo,
    Ring,
}

/// Which [`ShardLocationCache`](filecache_hint::ShardLocationCache) to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintBackend {
    Memory,
    File,
    None,
}

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Effective router kind. Defaults to modulo.
    pub fn router_kind(&self) -> anyhow::Result<RouterKind> {
        match self.topology.router.as_deref().unwrap_or("modulo") {
            "modulo" => Ok(RouterKind::Modulo),
            "ring" => Ok(RouterKind::Ring),
            other => anyhow::bail!("unknown router {other:?} (expected \"modulo\" or \"ring\")"),
        }
    }

    /// Effective shard count. Defaults to 4.
    pub fn shard_count(&self) -> u32 {
        self.topology.shards.unwrap_or(4)
    }

    /// Effective vnodes per shard for the ring router. Defaults to 64.
    pub fn vnodes_per_shard(&self) -> u16 {
        self.topology.vnodes_per_shard.unwrap_or(64)
    }

    /// Effective hint backend. Defaults to memory.
    pub fn hint_backend(&self) -> anyhow::Result<HintBackend> {
        match self.hints.backend.as_deref().unwrap_or("memory") {
            "memory" => Ok(HintBackend::Memory),
            "file" => Ok(HintBackend::File),
            "none" => Ok(HintBackend::None),
            other => anyhow::bail!(
                "unknown hint backend {other:?} (expected \"memory\", \"file\" or \"none\")"
            ),
        }
    }

    /// Effective memory hint capacity. Defaults to 100 000.
    pub fn hint_capacity(&self) -> usize {
        self.hints.capacity.unwrap_or(100_000)
    }

    /// Effective directory of the file hint backend.
    ///
    /// Defaults to `~/.fcache/hints`.
    pub fn hint_path(&self) -> PathBuf {
        self.hints.path.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".fcache").join("hints"))
                .unwrap_or_else(|| PathBuf::from(".fcache/hints"))
        })
    }
}

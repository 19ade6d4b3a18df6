//! `fcache`: look up file-cache entries across shards.
//!
//! Loads a dataset of rows into in-memory shards placed by the configured
//! router, then runs lookups through the same access layer a server would
//! use, reporting how many shard queries each one cost.
//!
//! # Usage
//!
//! ```text
//! fcache -c fcache.toml route 100            # which shard holds storage 100
//! fcache -c fcache.toml get 42               # lookup by id alone
//! fcache -c fcache.toml get 42 --storage 100 # lookup within one storage
//! fcache -c fcache.toml get-path files/a.txt --storage 100
//! fcache -c fcache.toml get-many 1 2 3       # batch lookup
//! fcache benchmark -n 10000 -s 64            # cold vs warm lookups
//! ```

mod config;
mod dataset;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use filecache_access::CacheAccess;
use filecache_hint::{
    FjallLocationCache, MemoryLocationCache, NoopLocationCache, ShardLocationCache,
};
use filecache_route::{ModuloRouter, RingRouter, ShardRouter};
use filecache_shard::{CountingQuery, MemoryShards};
use filecache_types::{CacheEntry, FileId, FileRow, StorageId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use config::{CliConfig, HintBackend, RouterKind};
use dataset::Dataset;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "fcache", version, about = "Sharded file-cache lookups")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true, env = "FCACHE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the shard a storage routes to.
    Route {
        storage: u64,
    },

    /// Look up one file by id.
    Get {
        file_id: u64,

        /// Only look in this storage's shard.
        #[arg(short, long)]
        storage: Option<u64>,
    },

    /// Look up one file by path within a storage.
    GetPath {
        path: String,

        #[arg(short, long)]
        storage: u64,
    },

    /// Look up many files by id.
    GetMany {
        #[arg(required = true)]
        file_ids: Vec<u64>,

        /// All ids belong to this storage.
        #[arg(short, long)]
        storage: Option<u64>,
    },

    /// Seed an in-memory dataset and compare cold and warm lookups.
    Benchmark {
        /// Number of files.
        #[arg(short = 'n', long, default_value = "10000")]
        count: u64,

        /// Number of distinct storages the files are spread over.
        #[arg(short, long, default_value = "64")]
        storages: u64,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    telemetry::init_console(&config.log.level);

    match cli.command {
        Commands::Route { storage } => cmd_route(&config, StorageId::new(storage)),
        Commands::Get { file_id, storage } => {
            cmd_get(&config, FileId::new(file_id), storage.map(StorageId::new)).await
        }
        Commands::GetPath { path, storage } => {
            cmd_get_path(&config, &path, StorageId::new(storage)).await
        }
        Commands::GetMany { file_ids, storage } => {
            let ids: Vec<FileId> = file_ids.into_iter().map(FileId::new).collect();
            cmd_get_many(&config, &ids, storage.map(StorageId::new)).await
        }
        Commands::Benchmark { count, storages } => cmd_benchmark(&config, count, storages).await,
    }
}

// -----------------------------------------------------------------------
// Wiring
// -----------------------------------------------------------------------

/// Everything a lookup command needs.
struct Stack {
    access: CacheAccess,
    counting: Arc<CountingQuery>,
}

fn build_router(config: &CliConfig) -> Result<Arc<dyn ShardRouter>> {
    let shards = config.shard_count();
    let router: Arc<dyn ShardRouter> = match config.router_kind()? {
        RouterKind::Modulo => Arc::new(ModuloRouter::new(shards)?),
        RouterKind::Ring => Arc::new(RingRouter::with_shard_count(
            shards,
            config.vnodes_per_shard(),
        )?),
    };
    Ok(router)
}

fn build_hints(config: &CliConfig) -> Result<Arc<dyn ShardLocationCache>> {
    let hints: Arc<dyn ShardLocationCache> = match config.hint_backend()? {
        HintBackend::Memory => Arc::new(MemoryLocationCache::new(config.hint_capacity())),
        HintBackend::File => {
            let path = config.hint_path();
            std::fs::create_dir_all(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Arc::new(
                FjallLocationCache::open(&path)
                    .with_context(|| format!("failed to open hint store {}", path.display()))?,
            )
        }
        HintBackend::None => Arc::new(NoopLocationCache),
    };
    Ok(hints)
}

/// Build the router, hint store and shards from `config`, loading the
/// configured dataset if any.
fn build_stack(config: &CliConfig) -> Result<Stack> {
    let router = build_router(config)?;
    let hints = build_hints(config)?;
    let shards = Arc::new(MemoryShards::new(router.all_shards()));

    if let Some(path) = &config.dataset.path {
        let loaded = Dataset::load(path)?.populate(router.as_ref(), &shards)?;
        info!(rows = loaded, path = %path.display(), "loaded dataset");
    }

    let counting = Arc::new(CountingQuery::new(shards.clone()));
    let access = CacheAccess::new(router, hints, counting.clone());
    Ok(Stack { access, counting })
}

fn print_entry(entry: &CacheEntry) {
    println!(
        "fileid={} storage={} path={:?} mimetype={} size={} mtime={} etag={:?}",
        entry.id(),
        entry.storage_id(),
        entry.path(),
        entry.mime_type(),
        entry.size(),
        entry.mtime(),
        entry.etag(),
    );
}

// -----------------------------------------------------------------------
// Lookup commands
// -----------------------------------------------------------------------

fn cmd_route(config: &CliConfig, storage: StorageId) -> Result<()> {
    let router = build_router(config)?;
    println!("storage {storage} -> shard {}", router.route(storage));
    Ok(())
}

async fn cmd_get(config: &CliConfig, file_id: FileId, storage: Option<StorageId>) -> Result<()> {
    let stack = build_stack(config)?;
    let entry = match storage {
        Some(storage) => stack.access.get_by_file_id_in_storage(file_id, storage).await?,
        None => stack.access.get_by_file_id(file_id).await?,
    };

    match &entry {
        Some(entry) => print_entry(entry),
        None => println!("file {file_id} not found"),
    }
    println!("queries: {}", stack.counting.call_count());
    Ok(())
}

async fn cmd_get_path(config: &CliConfig, path: &str, storage: StorageId) -> Result<()> {
    let stack = build_stack(config)?;
    match stack.access.get_by_path_in_storage(path, storage).await? {
        Some(entry) => print_entry(&entry),
        None => println!("{path:?} not found in storage {storage}"),
    }
    println!("queries: {}", stack.counting.call_count());
    Ok(())
}

async fn cmd_get_many(
    config: &CliConfig,
    file_ids: &[FileId],
    storage: Option<StorageId>,
) -> Result<()> {
    let stack = build_stack(config)?;
    let found = match storage {
        Some(storage) => stack.access.get_by_file_ids_in_storage(file_ids, storage).await?,
        None => stack.access.get_by_file_ids(file_ids).await?,
    };

    for entry in found.values() {
        print_entry(entry);
    }
    for id in file_ids.iter().filter(|id| !found.contains_key(id)) {
        println!("file {id} not found");
    }
    println!(
        "found {}/{} ({} queries)",
        found.len(),
        file_ids.len(),
        stack.counting.call_count()
    );
    Ok(())
}

// -----------------------------------------------------------------------
// fcache benchmark
// -----------------------------------------------------------------------

async fn cmd_benchmark(config: &CliConfig, count: u64, storages: u64) -> Result<()> {
    anyhow::ensure!(storages > 0, "need at least one storage");

    let router = build_router(config)?;
    let shard_ids = router.all_shards();
    let hints = Arc::new(MemoryLocationCache::new(config.hint_capacity()));

    println!("fcache benchmark");
    println!("  files:    {count}");
    println!("  storages: {storages}");
    println!("  shards:   {}", shard_ids.len());
    println!("  router:   {:?}", config.router_kind()?);
    println!();

    // In-memory setup: measures lookup logic, not a backend.
    let shards = Arc::new(MemoryShards::new(shard_ids));
    for n in 0..count {
        let storage = StorageId::new(n % storages);
        let row = FileRow::new(FileId::new(n), storage, &format!("files/{n}"));
        shards.insert(router.route(storage), row)?;
    }
    let counting = Arc::new(CountingQuery::new(shards.clone()));
    let access = CacheAccess::new(router, hints.clone(), counting.clone());

    let mut ids: Vec<FileId> = (0..count).map(FileId::new).collect();
    ids.shuffle(&mut StdRng::seed_from_u64(0xFCAC_4E));

    for pass in ["cold", "warm"] {
        counting.reset();
        print!("{pass:>4} lookups... ");
        let start = Instant::now();
        let mut missing = 0u64;
        for &id in &ids {
            if access.get_by_file_id(id).await?.is_none() {
                missing += 1;
            }
        }
        let dur = start.elapsed();
        let queries = counting.call_count();
        println!(
            "{:.2}s, {queries} queries ({:.2}/lookup), {missing} missing",
            dur.as_secs_f64(),
            queries as f64 / count.max(1) as f64,
        );
        debug!(pass, queries, "benchmark pass finished");
    }

    counting.reset();
    print!("batch lookup... ");
    let start = Instant::now();
    let found = access.get_by_file_ids(&ids).await?;
    println!(
        "{:.2}s, {} queries, {}/{} found",
        start.elapsed().as_secs_f64(),
        counting.call_count(),
        found.len(),
        ids.len(),
    );

    println!();
    println!("Summary:");
    println!("  hints held:    {}", hints.len());
    println!("  hint hit rate: {:.1}%", hints.stats().hit_rate() * 100.0);
    println!("  rows stored:   {}", shards.total_rows()?);

    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ethdag Node
//!
//! Entry point for the `ethdag-node` binary. Parses CLI arguments,
//! initializes logging, opens the block store and runs one subcommand:
//!
//! - `publish` — publish payload files, print one CID record per file
//! - `cid`     — print the CID of raw bytes under a codec
//! - `stats`   — print the number of blocks in the store
//! - `version` — print build version information
//!
//! Logs go to stderr; stdout only ever carries results.

mod cli;
mod logging;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use ethdag_protocol::config::{CID_VERSION, MULTIHASH_KECCAK_256};
use ethdag_protocol::storage::SledBlockstore;
use ethdag_protocol::{Cid, CidPayload, IpldPayload, IpldPublisher, Publisher};

use cli::{Commands, EthDagCli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = EthDagCli::parse();
    logging::init_logging("ethdag_node=info,ethdag_protocol=info", cli.log_format);

    match cli.command {
        Commands::Publish(args) => run_publish(args).await,
        Commands::Cid(args) => print_cid(args),
        Commands::Stats(args) => print_stats(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Opens (creating if needed) the sled block store at `path`.
fn open_store(path: &Path) -> Result<SledBlockstore> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("failed to create store directory: {}", path.display()))?;
    let store = SledBlockstore::open(path)
        .with_context(|| format!("failed to open block store at {}", path.display()))?;
    tracing::info!(path = %path.display(), blocks = store.len(), "block store opened");
    Ok(store)
}

async fn run_publish(args: cli::PublishArgs) -> Result<()> {
    let store = Arc::new(open_store(&args.store.store)?);
    let publisher: Arc<dyn IpldPublisher> = Arc::new(Publisher::new(store.clone()));

    let stdout = std::io::stdout();
    let result = publish_files(publisher, &args.payloads, args.concurrency, |record| {
        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, record)?;
        writeln!(out)?;
        Ok(())
    })
    .await;

    // Blocks written before a failure are still worth keeping.
    store.flush().context("failed to flush block store")?;
    let published = result?;
    tracing::info!(published, blocks = store.len(), "publish finished");
    Ok(())
}

/// Publishes every payload file on the blocking pool, at most `concurrency`
/// at a time, and hands the results to `emit` in argument order.
///
/// All files are read and parsed before the first store write, so a
/// malformed file leaves the store untouched. Once a publish fails, no
/// further publish starts; the ones already running are waited for, so
/// nothing reaches the store after this returns. Returns how many records
/// were emitted.
async fn publish_files<F>(
    publisher: Arc<dyn IpldPublisher>,
    paths: &[PathBuf],
    concurrency: usize,
    mut emit: F,
) -> Result<usize>
where
    F: FnMut(&CidPayload) -> Result<()>,
{
    let permits = Arc::new(Semaphore::new(concurrency));
    let payloads = load_payloads(paths, &permits).await?;

    let cancelled = Arc::new(AtomicBool::new(false));
    let mut tasks: Vec<JoinHandle<Result<CidPayload>>> = paths
        .iter()
        .cloned()
        .zip(payloads)
        .map(|(path, payload)| {
            let publisher = Arc::clone(&publisher);
            let permits = Arc::clone(&permits);
            let cancelled = Arc::clone(&cancelled);
            tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .context("publish semaphore closed")?;
                tokio::task::spawn_blocking(move || {
                    if cancelled.load(Ordering::SeqCst) {
                        anyhow::bail!("skipped {} after an earlier failure", path.display());
                    }
                    let result = publish_one(publisher.as_ref(), &path, &payload);
                    if result.is_err() {
                        // Set while the permit is still held, so no queued
                        // file can start after this one failed.
                        cancelled.store(true, Ordering::SeqCst);
                    }
                    result
                })
                .await
                .context("publish task panicked")?
            })
        })
        .collect();

    let mut emitted = 0;
    for i in 0..tasks.len() {
        let outcome = (&mut tasks[i])
            .await
            .context("publish task panicked")
            .and_then(|result| result)
            .and_then(|record| emit(&record));
        if let Err(err) = outcome {
            cancelled.store(true, Ordering::SeqCst);
            drain(tasks.drain(i + 1..)).await;
            return Err(err);
        }
        emitted += 1;
    }
    Ok(emitted)
}

/// Reads and parses every payload file, at most `permits` at a time.
/// Results come back in argument order; the first failure wins.
async fn load_payloads(
    paths: &[PathBuf],
    permits: &Arc<Semaphore>,
) -> Result<Vec<IpldPayload>> {
    let mut tasks: Vec<JoinHandle<Result<IpldPayload>>> = paths
        .iter()
        .cloned()
        .map(|path| {
            let permits = Arc::clone(permits);
            tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .context("publish semaphore closed")?;
                let raw = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
                tokio::task::spawn_blocking(move || parse_payload(&path, &raw))
                    .await
                    .context("parse task panicked")?
            })
        })
        .collect();

    let mut payloads = Vec::with_capacity(tasks.len());
    for i in 0..tasks.len() {
        let outcome = (&mut tasks[i])
            .await
            .context("parse task panicked")
            .and_then(|result| result);
        match outcome {
            Ok(payload) => payloads.push(payload),
            Err(err) => {
                for rest in &tasks[i + 1..] {
                    rest.abort();
                }
                return Err(err);
            }
        }
    }
    Ok(payloads)
}

/// Waits for tasks whose results are no longer wanted.
async fn drain<T>(tasks: impl Iterator<Item = JoinHandle<T>>) {
    for task in tasks {
        let _ = task.await;
    }
}

fn parse_payload(path: &Path, raw: &[u8]) -> Result<IpldPayload> {
    serde_json::from_slice(raw)
        .with_context(|| format!("{} is not a valid block payload", path.display()))
}

fn publish_one(
    publisher: &dyn IpldPublisher,
    path: &Path,
    payload: &IpldPayload,
) -> Result<CidPayload> {
    publisher.publish(payload).with_context(|| {
        format!(
            "failed to publish block {} from {}",
            payload.block_number,
            path.display()
        )
    })
}

fn print_cid(args: cli::CidArgs) -> Result<()> {
    let data = decode_hex(&args.data)?;
    println!("{}", Cid::derive(args.codec, &data));
    Ok(())
}

fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(digits).with_context(|| format!("invalid hex input {input:?}"))
}

fn print_stats(args: cli::StoreArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    println!("{}", store.len());
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("ethdag-node {}", env!("CARGO_PKG_VERSION"));
    println!("cid         v{CID_VERSION}, keccak-256 (0x{MULTIHASH_KECCAK_256:x})");
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

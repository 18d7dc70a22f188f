//! # CLI Interface
//!
//! Defines the command-line argument structure for `ethdag-node` using
//! `clap` derive. Store location, log format and publish concurrency can
//! all be set from the environment.

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ethdag_protocol::config::{DEFAULT_PUBLISH_CONCURRENCY, DEFAULT_STORE_PATH};
use ethdag_protocol::Codec;

use crate::logging::LogFormat;

/// Publishes Ethereum block payloads into a content-addressed block store
/// and prints the CID of every object published.
#[derive(Parser, Debug)]
#[command(
    name = "ethdag-node",
    about = "Publish Ethereum block data as IPLD",
    version,
    propagate_version = true
)]
pub struct EthDagCli {
    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "ETHDAG_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish one or more payload files and print their CID records.
    Publish(PublishArgs),
    /// Print the CID of raw bytes under a codec. Nothing is stored.
    Cid(CidArgs),
    /// Print the number of blocks held by the store.
    Stats(StoreArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Directory of the block store. Created if it does not exist.
    #[arg(long, short = 's', env = "ETHDAG_STORE", default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// How many payloads are published at the same time.
    #[arg(
        long,
        short = 'j',
        env = "ETHDAG_CONCURRENCY",
        default_value_t = DEFAULT_PUBLISH_CONCURRENCY,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub concurrency: usize,

    /// JSON payload files, one block each. Output follows argument order.
    #[arg(required = true)]
    pub payloads: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CidArgs {
    /// Codec name, e.g. `eth-block` or `eth-tx`.
    #[arg(long, short = 'c')]
    pub codec: Codec,

    /// Hex-encoded bytes, with or without `0x`.
    pub data: String,
}

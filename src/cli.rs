use alloy_primitives::Address;
use clap::{Args, Parser, Subcommand};
use std::ops::Range;
use std::path::PathBuf;

use crate::constants::DEFAULT_RPC_URL;
use crate::layout::PackingOrder;

/// CLI arguments for slotbreach
#[derive(Parser, Debug)]
#[command(
    name = "slotbreach",
    about = "Reads \"private\" contract storage and unlocks the contract with it"
)]
pub struct Cli {
    /// JSON-RPC endpoint of the node hosting the target.
    #[arg(long, global = true, env = "ETH_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// JSON file overriding lock/key fields, packing order and RPC timings.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as newline-delimited JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the slot and byte offset of every declared field.
    Layout(LayoutArgs),

    /// Read one field from storage, whatever its visibility.
    Peek(PeekArgs),

    /// Read every field of the layout from storage.
    Dump(DumpArgs),

    /// Deploy the target from a build artifact, with random private data.
    Deploy(DeployArgs),

    /// Recover the key from storage and unlock the target.
    Attack(AttackArgs),

    /// Deploy the target on an in-memory ledger and break it.
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Solidity storage section to resolve. Defaults to the `Privacy` contract.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Packed-scalar convention: `msb` (first field at byte 0) or `lsb` (solc).
    #[arg(long)]
    pub order: Option<PackingOrder>,

    /// Print the layout as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PeekArgs {
    /// Contract to read.
    #[arg(long)]
    pub target: Address,

    /// Field selector, e.g. `flattening` or `data[2]`.
    #[arg(long)]
    pub field: String,

    /// Byte range within the field, `start..end`. Defaults to the whole field.
    #[arg(long, value_parser = parse_byte_range)]
    pub range: Option<Range<usize>>,

    /// Solidity storage section describing the target.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Contract to read.
    #[arg(long)]
    pub target: Address,

    /// Solidity storage section describing the target.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Truffle or hardhat build artifact of the target.
    #[arg(long)]
    pub artifact: PathBuf,

    /// Deployer. Must be unlocked on the node unless `--owner-key` is given.
    #[arg(long)]
    pub owner: Option<Address>,

    /// Deployer private key (hex). Can also be set via OWNER_KEY environment variable.
    #[arg(long, env = "OWNER_KEY", hide_env_values = true)]
    pub owner_key: Option<String>,

    /// Also deploy this `Hacker` artifact from the same account.
    #[arg(long)]
    pub proxy_artifact: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AttackArgs {
    /// Contract to unlock.
    #[arg(long)]
    pub target: Address,

    /// Unprivileged sender. Must be unlocked on the node unless
    /// `--attacker-key` is given.
    #[arg(long)]
    pub attacker: Option<Address>,

    /// Attacker private key (hex). Transactions are then signed locally.
    /// Can also be set via ATTACKER_KEY environment variable.
    #[arg(long, env = "ATTACKER_KEY", hide_env_values = true)]
    pub attacker_key: Option<String>,

    /// Deployed `Hacker` contract to route the unlock through.
    #[arg(long)]
    pub proxy: Option<Address>,

    /// Field holding the key (overrides the config file).
    #[arg(long)]
    pub field: Option<String>,

    /// Key bytes within the field, `start..end` (overrides the config file).
    #[arg(long, value_parser = parse_byte_range)]
    pub range: Option<Range<usize>>,

    /// Solidity storage section describing the target.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Deploy a `Hacker` contract and attack through it.
    #[arg(long)]
    pub proxy: bool,

    /// Byte range of `data[2]` submitted as the key.
    #[arg(long, value_parser = parse_byte_range)]
    pub range: Option<Range<usize>>,
}

/// Parse `start..end` (end exclusive).
pub fn parse_byte_range(s: &str) -> Result<Range<usize>, String> {
    let (start, end) = s
        .split_once("..")
        .ok_or_else(|| format!("expected `start..end`, got `{s}`"))?;
    let start = start.trim().parse::<usize>().map_err(|e| format!("bad range start: {e}"))?;
    let end = end.trim().parse::<usize>().map_err(|e| format!("bad range end: {e}"))?;
    Ok(start..end)
}

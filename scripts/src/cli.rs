//! Definitions of CLI arguments and commands for deploy scripts

use std::path::PathBuf;

use alloy_primitives::Address;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::{
    commands::{predict_plan_addresses, resolve_params_file, run_plan},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_CREATE2_FACTORY, DEFAULT_DEPLOYMENTS_PATH,
        DEFAULT_ROUTER_PARAMS_PATH, NUM_DEPLOY_CONFIRMATIONS,
    },
    deployer::{predict_create_address, AlloyDeployer},
    errors::ScriptError,
    types::{DeployOptions, DeploymentContext, DeploymentPlan},
    utils::{parse_signer, setup_client},
};

/// Deploy the UniversalRouter and its canonical dependencies
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The available commands
#[derive(Subcommand)]
pub enum Command {
    /// Run a deployment plan against a network
    Deploy(DeployArgs),
    /// Predict the CREATE2 addresses of a plan without sending anything
    Predict(PredictArgs),
    /// Resolve a router parameter file against a stand-in address
    ResolveParams(ResolveParamsArgs),
}

impl Command {
    /// Run the command
    pub async fn run(self) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => deploy(args).await,
            Command::Predict(args) => predict(args),
            Command::ResolveParams(args) => {
                resolve_params_file(&args.params, args.fallback).map(|_| ())
            }
        }
    }
}

/// Run a deployment plan
#[derive(Args)]
pub struct DeployArgs {
    /// Private key of the deployer
    #[arg(short, long, env = "PKEY")]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL")]
    pub rpc_url: String,

    /// The deployment plan to run
    #[arg(long, value_enum)]
    pub plan: DeploymentPlan,

    /// Path to the router parameters file
    #[arg(long, default_value = DEFAULT_ROUTER_PARAMS_PATH)]
    pub params: PathBuf,

    /// Directory holding the compiled contract artifacts
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// File deployed addresses are recorded in
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments_path: PathBuf,

    /// The CREATE2 factory salted deployments go through
    #[arg(long, default_value_t = DEFAULT_CREATE2_FACTORY)]
    pub create2_factory: Address,

    /// Confirmations to wait for on each deployment
    #[arg(long, default_value_t = NUM_DEPLOY_CONFIRMATIONS)]
    pub confirmations: u64,

    /// Gas limit override for each deployment
    #[arg(long)]
    pub gas_limit: Option<u64>,
}

/// Predict the addresses a plan will deploy to
#[derive(Args)]
pub struct PredictArgs {
    /// The deployment plan to predict
    #[arg(long, value_enum)]
    pub plan: DeploymentPlan,

    /// Path to the router parameters file
    #[arg(long, default_value = DEFAULT_ROUTER_PARAMS_PATH)]
    pub params: PathBuf,

    /// Directory holding the compiled contract artifacts
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// The CREATE2 factory salted deployments go through
    #[arg(long, default_value_t = DEFAULT_CREATE2_FACTORY)]
    pub create2_factory: Address,

    /// Address of an already deployed stand-in contract
    #[arg(long, conflicts_with_all = ["deployer", "nonce"])]
    pub stand_in: Option<Address>,

    /// Deployer address, used with `--nonce` to predict the stand-in's address
    #[arg(long, requires = "nonce")]
    pub deployer: Option<Address>,

    /// The deployer nonce the stand-in will be deployed with
    #[arg(long, requires = "deployer")]
    pub nonce: Option<u64>,
}

/// Resolve a router parameter file
#[derive(Args)]
pub struct ResolveParamsArgs {
    /// Path to the router parameters file
    #[arg(long, default_value = DEFAULT_ROUTER_PARAMS_PATH)]
    pub params: PathBuf,

    /// The address substituted for unsupported protocols
    #[arg(long)]
    pub fallback: Address,
}

/// Connect to the network and run the selected plan
async fn deploy(args: DeployArgs) -> Result<(), ScriptError> {
    let signer = parse_signer(&args.priv_key)?;
    let deployer_address = signer.address();
    let client = setup_client(signer, &args.rpc_url).await?;
    let deployer = AlloyDeployer::new(
        client,
        deployer_address,
        args.create2_factory,
        args.artifacts_dir,
    );

    let ctx = DeploymentContext {
        options: DeployOptions {
            confirmations: args.confirmations,
            gas_limit: args.gas_limit,
        },
        params_path: args.params,
        deployments_path: Some(args.deployments_path),
    };

    let deployed = run_plan(args.plan, &deployer, &ctx).await?;
    for contract in deployed.iter() {
        info!(
            "{} at {:#x} (tx {:#x})",
            contract.name, contract.address, contract.tx_hash
        );
    }

    Ok(())
}

/// Predict a plan's addresses
fn predict(args: PredictArgs) -> Result<(), ScriptError> {
    let stand_in = match (args.stand_in, args.deployer, args.nonce) {
        (Some(address), _, _) => Some(address),
        (None, Some(deployer), Some(nonce)) => {
            let address = predict_create_address(deployer, nonce);
            info!("Stand-in will deploy to {:#x}", address);
            Some(address)
        }
        _ => None,
    };

    predict_plan_addresses(
        args.plan,
        &args.artifacts_dir,
        args.create2_factory,
        &args.params,
        stand_in,
    )
    .map(|_| ())
}

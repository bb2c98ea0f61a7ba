//! Implementations of the deployment plans and the offline helper commands

use std::path::Path;

use alloy_primitives::Address;
use tracing::{info, warn};

use crate::{
    deployer::{build_init_code, predict_create2_address, ContractDeployer},
    errors::ScriptError,
    params::{load_parameters, resolve, RouterParameterSet},
    types::{ContractName, DeployedContract, DeploymentContext, DeploymentPlan},
    utils::{read_artifact_bytecode, write_deployed_address},
};

/// The contracts deployed by a run of the router plan
#[derive(Debug, Clone)]
pub struct RouterDeployment {
    /// The unsupported-protocol stand-in
    pub unsupported: DeployedContract,
    /// The router itself
    pub router: DeployedContract,
    /// The resolved parameters the router was constructed with
    pub params: RouterParameterSet,
}

/// Execute a deployment plan, returning the deployed contracts in order
pub async fn run_plan<D: ContractDeployer>(
    plan: DeploymentPlan,
    deployer: &D,
    ctx: &DeploymentContext,
) -> Result<Vec<DeployedContract>, ScriptError> {
    info!("Running the `{}` deployment plan", plan);

    match plan {
        DeploymentPlan::Base | DeploymentPlan::BaseWithPermit2 => {
            let mut deployed = Vec::with_capacity(plan.contracts().len());
            for name in plan.contracts() {
                deployed.push(deploy_canonical(*name, deployer, ctx).await?);
            }
            Ok(deployed)
        }
        DeploymentPlan::Router => {
            let RouterDeployment {
                unsupported,
                router,
                ..
            } = deploy_router(deployer, ctx).await?;
            Ok(vec![unsupported, router])
        }
    }
}

/// Deploy a constructor-less contract at its canonical address
pub async fn deploy_canonical<D: ContractDeployer>(
    name: ContractName,
    deployer: &D,
    ctx: &DeploymentContext,
) -> Result<DeployedContract, ScriptError> {
    let deployed = deployer
        .deploy_contract(name, name.deployment_mode(), &[], &ctx.options)
        .await?;
    record_deployment(ctx, &deployed)?;
    Ok(deployed)
}

/// Deploy the UniversalRouter.
///
/// 1. Deploy the `UnsupportedProtocol` stand-in with CREATE
/// 2. Load the router parameters from `ctx.params_path`
/// 3. Resolve unsupported slots to the stand-in's address
/// 4. Deploy the router with CREATE2, the resolved parameters as its sole
///    constructor argument
///
/// The parameter file is read and checked for completeness before anything
/// is sent, so a bad file fails without deploying. Each step completes
/// before the next begins and any failure aborts the rest. Deployments are
/// not rolled back: a failure after step 1 leaves the stand-in deployed and
/// orphaned, and re-running deploys a second stand-in at a different address
/// unless the operator intervenes.
pub async fn deploy_router<D: ContractDeployer>(
    deployer: &D,
    ctx: &DeploymentContext,
) -> Result<RouterDeployment, ScriptError> {
    let raw_params = load_parameters(&ctx.params_path)?;
    raw_params.ensure_complete()?;

    let unsupported = deploy_stand_in(deployer, ctx).await?;

    match deploy_router_with_fallback(deployer, &raw_params, unsupported.address, ctx).await {
        Ok((router, params)) => Ok(RouterDeployment {
            unsupported,
            router,
            params,
        }),
        Err(e) => {
            warn!(
                "Router deployment failed after the stand-in was deployed at {:#x}; \
                 the stand-in is orphaned and a re-run will deploy a new one",
                unsupported.address
            );
            Err(e)
        }
    }
}

/// Deploy the stand-in substituted for unsupported protocols
async fn deploy_stand_in<D: ContractDeployer>(
    deployer: &D,
    ctx: &DeploymentContext,
) -> Result<DeployedContract, ScriptError> {
    let name = ContractName::UnsupportedProtocol;
    let deployed = deployer
        .deploy_contract(name, name.deployment_mode(), &[], &ctx.options)
        .await?;

    if deployed.address.is_zero() {
        return Err(ScriptError::DependencyUnavailable(format!(
            "{} reported the zero address",
            name
        )));
    }

    record_deployment(ctx, &deployed)?;
    Ok(deployed)
}

/// Steps 3 and 4 of the router plan, on an already loaded parameter set
async fn deploy_router_with_fallback<D: ContractDeployer>(
    deployer: &D,
    raw_params: &RouterParameterSet,
    fallback: Address,
    ctx: &DeploymentContext,
) -> Result<(DeployedContract, RouterParameterSet), ScriptError> {
    let params = resolve(raw_params, fallback)?;
    info!("Router parameters: {}", params_to_json(&params)?);

    let constructor_args = [params.to_constructor_arg()?];
    let name = ContractName::UniversalRouter;
    let router = deployer
        .deploy_contract(name, name.deployment_mode(), &constructor_args, &ctx.options)
        .await?;
    record_deployment(ctx, &router)?;

    Ok((router, params))
}

/// Write a deployed address to the deployments file, if one is configured
fn record_deployment(
    ctx: &DeploymentContext,
    deployed: &DeployedContract,
) -> Result<(), ScriptError> {
    match &ctx.deployments_path {
        Some(path) => {
            write_deployed_address(path, deployed.name.artifact_name(), deployed.address)
        }
        None => Ok(()),
    }
}

/// Render a parameter set as pretty JSON
fn params_to_json(params: &RouterParameterSet) -> Result<String, ScriptError> {
    serde_json::to_string_pretty(params).map_err(|e| ScriptError::Serde(e.to_string()))
}

// --------------------
// | Offline Commands |
// --------------------

/// Load a parameter file and resolve it against `fallback`, without
/// touching the network
pub fn resolve_params_file(
    params_path: &Path,
    fallback: Address,
) -> Result<RouterParameterSet, ScriptError> {
    let params = resolve(&load_parameters(params_path)?, fallback)?;
    info!("Resolved router parameters: {}", params_to_json(&params)?);
    Ok(params)
}

/// Predict the CREATE2 addresses of the salted contracts in a plan.
///
/// The router's address depends on its resolved parameters, so predicting it
/// needs the stand-in's address.
pub fn predict_plan_addresses(
    plan: DeploymentPlan,
    artifacts_dir: &Path,
    create2_factory: Address,
    params_path: &Path,
    stand_in: Option<Address>,
) -> Result<Vec<(ContractName, Address)>, ScriptError> {
    let mut predictions = Vec::new();
    for name in plan.contracts() {
        let Some(salt) = name.canonical_salt() else {
            continue;
        };

        let constructor_args = match name {
            ContractName::UniversalRouter => {
                let fallback = stand_in.ok_or_else(|| {
                    ScriptError::DependencyUnavailable(
                        "predicting the router address needs the stand-in address".to_string(),
                    )
                })?;
                let params = resolve(&load_parameters(params_path)?, fallback)?;
                vec![params.to_constructor_arg()?]
            }
            _ => vec![],
        };

        let creation_code = read_artifact_bytecode(artifacts_dir, *name)?;
        let init_code = build_init_code(&creation_code, &constructor_args);
        let address = predict_create2_address(create2_factory, salt, &init_code);
        info!("{} will deploy to {:#x}", name, address);
        predictions.push((*name, address));
    }

    Ok(predictions)
}

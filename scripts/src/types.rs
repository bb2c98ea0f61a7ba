//! Type definitions used throughout the scripts

use std::{
    fmt::{self, Display},
    path::PathBuf,
};

use alloy::{dyn_abi::DynSolValue, network::Ethereum, providers::DynProvider};
use alloy_primitives::{Address, TxHash, B256};
use clap::ValueEnum;

use crate::constants::{NUM_DEPLOY_CONFIRMATIONS, PERMIT2_SALT, ROUTER_SALT, WETH9_SALT};

/// The signer-backed provider every deployment is submitted through
pub type Wallet = DynProvider<Ethereum>;

/// The contracts the scripts know how to deploy
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ContractName {
    /// The canonical wrapped ether token
    Weth9,
    /// The canonical Permit2 contract
    Permit2,
    /// The stand-in substituted for protocols unsupported on the target network
    UnsupportedProtocol,
    /// The UniversalRouter contract
    UniversalRouter,
}

impl ContractName {
    /// The name of the compilation artifact for the contract
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ContractName::Weth9 => "WETH9",
            ContractName::Permit2 => "Permit2",
            ContractName::UnsupportedProtocol => "UnsupportedProtocol",
            ContractName::UniversalRouter => "UniversalRouter",
        }
    }

    /// The pre-agreed CREATE2 salt for the contract, if it is deployed
    /// at a deterministic address
    pub fn canonical_salt(&self) -> Option<B256> {
        match self {
            ContractName::Weth9 => Some(WETH9_SALT),
            ContractName::Permit2 => Some(PERMIT2_SALT),
            ContractName::UniversalRouter => Some(ROUTER_SALT),
            ContractName::UnsupportedProtocol => None,
        }
    }

    /// The deployment mode the contract is always deployed with
    pub fn deployment_mode(&self) -> DeploymentMode {
        match self.canonical_salt() {
            Some(salt) => DeploymentMode::Create2 { salt },
            None => DeploymentMode::Create,
        }
    }
}

impl Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.artifact_name())
    }
}

/// How a contract's address is derived
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Ordinary creation, the address depends on the deployer's nonce
    Create,
    /// Deterministic creation through the CREATE2 factory
    Create2 {
        /// The salt mixed into the address
        salt: B256,
    },
}

impl Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentMode::Create => write!(f, "create"),
            DeploymentMode::Create2 { salt } => write!(f, "create2 (salt {salt})"),
        }
    }
}

/// Per-deployment transaction options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    /// The number of confirmations to wait for
    pub confirmations: u64,
    /// An explicit gas limit, left to the provider when unset
    pub gas_limit: Option<u64>,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            confirmations: NUM_DEPLOY_CONFIRMATIONS,
            gas_limit: None,
        }
    }
}

/// The result of a single successful deployment
#[derive(Debug, Clone, PartialEq)]
pub struct DeployedContract {
    /// The contract that was deployed
    pub name: ContractName,
    /// The address the contract lives at
    pub address: Address,
    /// The mode the contract was deployed with
    pub mode: DeploymentMode,
    /// The constructor arguments the contract was deployed with
    pub constructor_args: Vec<DynSolValue>,
    /// The hash of the deployment transaction
    pub tx_hash: TxHash,
}

/// The selectable deployment plans
#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeploymentPlan {
    /// Deploy WETH9 at its canonical address
    Base,
    /// Deploy WETH9 and Permit2 at their canonical addresses
    BaseWithPermit2,
    /// Deploy the unsupported-protocol stand-in, then the UniversalRouter
    Router,
}

impl DeploymentPlan {
    /// The contracts the plan deploys, in order
    pub fn contracts(&self) -> &'static [ContractName] {
        match self {
            DeploymentPlan::Base => &[ContractName::Weth9],
            DeploymentPlan::BaseWithPermit2 => &[ContractName::Weth9, ContractName::Permit2],
            DeploymentPlan::Router => {
                &[ContractName::UnsupportedProtocol, ContractName::UniversalRouter]
            }
        }
    }
}

impl Display for DeploymentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentPlan::Base => write!(f, "base"),
            DeploymentPlan::BaseWithPermit2 => write!(f, "base-with-permit2"),
            DeploymentPlan::Router => write!(f, "router"),
        }
    }
}

/// Inputs shared by every step of a plan
#[derive(Debug, Clone)]
pub struct DeploymentContext {
    /// Transaction options for every deployment
    pub options: DeployOptions,
    /// The router parameters file
    pub params_path: PathBuf,
    /// Where to record deployed addresses, if anywhere
    pub deployments_path: Option<PathBuf>,
}

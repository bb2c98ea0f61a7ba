//! Contract deployment, either at a nonce-derived address or at a
//! deterministic CREATE2 address

use std::path::PathBuf;

use alloy::{
    dyn_abi::DynSolValue,
    network::TransactionBuilder,
    providers::Provider,
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use alloy_primitives::{Address, Bytes, TxHash, B256};
use tracing::{info, warn};

use crate::{
    errors::ScriptError,
    types::{ContractName, DeployOptions, DeployedContract, DeploymentMode, Wallet},
    utils::read_artifact_bytecode,
};

/// A primitive capable of deploying a single named contract.
///
/// Implementations submit one transaction per call and return once it is
/// mined. Callers must not run two deployments against the same deployer key
/// concurrently, each submission consumes the next nonce.
#[allow(async_fn_in_trait)]
pub trait ContractDeployer {
    /// Deploy `name` with the given mode and constructor arguments
    async fn deploy_contract(
        &self,
        name: ContractName,
        mode: DeploymentMode,
        constructor_args: &[DynSolValue],
        options: &DeployOptions,
    ) -> Result<DeployedContract, ScriptError>;
}

// ----------------------
// | Address Prediction |
// ----------------------

/// Append the ABI-encoded constructor arguments to a contract's creation code
pub fn build_init_code(creation_code: &[u8], constructor_args: &[DynSolValue]) -> Bytes {
    let encoded_args = DynSolValue::Tuple(constructor_args.to_vec()).abi_encode_params();
    [creation_code, encoded_args.as_slice()].concat().into()
}

/// The address of a contract created by `deployer` at the given nonce
pub fn predict_create_address(deployer: Address, nonce: u64) -> Address {
    deployer.create(nonce)
}

/// The address of a contract created through `factory` with CREATE2
pub fn predict_create2_address(factory: Address, salt: B256, init_code: &[u8]) -> Address {
    factory.create2_from_code(salt, init_code)
}

/// Calldata for the deterministic deployment proxy: the salt followed by the init code
pub fn create2_factory_calldata(salt: B256, init_code: &[u8]) -> Bytes {
    [salt.as_slice(), init_code].concat().into()
}

// ------------------
// | Alloy Deployer |
// ------------------

/// Deploys contracts from local artifacts through an alloy provider
pub struct AlloyDeployer {
    /// The signer-backed provider
    client: Wallet,
    /// The address of the signer, whose nonce CREATE deployments consume
    deployer_address: Address,
    /// The CREATE2 factory salted deployments are routed through
    create2_factory: Address,
    /// The directory compilation artifacts are read from
    artifacts_dir: PathBuf,
}

impl AlloyDeployer {
    /// Constructor
    pub fn new(
        client: Wallet,
        deployer_address: Address,
        create2_factory: Address,
        artifacts_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            deployer_address,
            create2_factory,
            artifacts_dir,
        }
    }

    /// The address of the deploying account
    pub fn deployer_address(&self) -> Address {
        self.deployer_address
    }

    /// Fail with [`ScriptError::AddressCollision`] if the address already holds code
    async fn ensure_unoccupied(&self, address: Address) -> Result<(), ScriptError> {
        let code = self
            .client
            .get_code_at(address)
            .await
            .map_err(|e| ScriptError::DeploymentFailure(e.to_string()))?;

        if code.is_empty() {
            Ok(())
        } else {
            Err(ScriptError::AddressCollision(address))
        }
    }

    /// Send a transaction and wait for a successful receipt
    async fn send_and_confirm(
        &self,
        tx: TransactionRequest,
        options: &DeployOptions,
    ) -> Result<TransactionReceipt, ScriptError> {
        let tx = match options.gas_limit {
            Some(gas_limit) => tx.with_gas_limit(gas_limit),
            None => tx,
        };

        let receipt = self
            .client
            .send_transaction(tx)
            .await
            .map_err(|e| ScriptError::DeploymentFailure(e.to_string()))?
            .with_required_confirmations(options.confirmations)
            .get_receipt()
            .await
            .map_err(|e| ScriptError::DeploymentFailure(e.to_string()))?;

        ensure_succeeded(&receipt)?;
        Ok(receipt)
    }

    /// Fail with [`ScriptError::DeploymentFailure`] if no code was left at
    /// `address` by the given transaction
    async fn ensure_deployed(&self, address: Address, tx_hash: TxHash) -> Result<(), ScriptError> {
        let code = self
            .client
            .get_code_at(address)
            .await
            .map_err(|e| ScriptError::DeploymentFailure(e.to_string()))?;

        if code.is_empty() {
            return Err(ScriptError::DeploymentFailure(format!(
                "no code at {:#x} after CREATE2 transaction {:#x}",
                address, tx_hash
            )));
        }
        Ok(())
    }
}

/// Fail with [`ScriptError::DeploymentFailure`] if a mined transaction reverted
fn ensure_succeeded(receipt: &TransactionReceipt) -> Result<(), ScriptError> {
    if !receipt.status() {
        return Err(ScriptError::DeploymentFailure(format!(
            "transaction {:#x} reverted",
            receipt.transaction_hash
        )));
    }
    Ok(())
}

/// The address a CREATE transaction deployed to
fn created_address(receipt: &TransactionReceipt) -> Result<Address, ScriptError> {
    receipt.contract_address.ok_or_else(|| {
        ScriptError::DependencyUnavailable(format!(
            "no contract address in receipt of {:#x}",
            receipt.transaction_hash
        ))
    })
}

impl ContractDeployer for AlloyDeployer {
    async fn deploy_contract(
        &self,
        name: ContractName,
        mode: DeploymentMode,
        constructor_args: &[DynSolValue],
        options: &DeployOptions,
    ) -> Result<DeployedContract, ScriptError> {
        let creation_code = read_artifact_bytecode(&self.artifacts_dir, name)?;
        let init_code = build_init_code(&creation_code, constructor_args);
        info!("Deploying {} via {}", name, mode);

        let (receipt, address) = match mode {
            DeploymentMode::Create => {
                let nonce = self
                    .client
                    .get_transaction_count(self.deployer_address)
                    .await
                    .map_err(|e| ScriptError::NonceFetching(e.to_string()))?;
                let expected = predict_create_address(self.deployer_address, nonce);

                let tx = TransactionRequest::default()
                    .with_from(self.deployer_address)
                    .with_deploy_code(init_code);
                let receipt = self.send_and_confirm(tx, options).await?;

                let address = created_address(&receipt)?;
                if address != expected {
                    warn!(
                        "{} landed at {:#x}, expected {:#x} from nonce {}",
                        name, address, expected, nonce
                    );
                }

                (receipt, address)
            }
            DeploymentMode::Create2 { salt } => {
                let expected = predict_create2_address(self.create2_factory, salt, &init_code);
                self.ensure_unoccupied(expected).await?;

                let tx = TransactionRequest::default()
                    .with_from(self.deployer_address)
                    .with_to(self.create2_factory)
                    .with_input(create2_factory_calldata(salt, &init_code));
                let receipt = self.send_and_confirm(tx, options).await?;
                self.ensure_deployed(expected, receipt.transaction_hash).await?;

                (receipt, expected)
            }
        };

        info!("{} deployed at {:#x}", name, address);

        Ok(DeployedContract {
            name,
            address,
            mode,
            constructor_args: constructor_args.to_vec(),
            tx_hash: receipt.transaction_hash,
        })
    }
}

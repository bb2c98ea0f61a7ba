//! Utilities for the deploy scripts.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::{
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use alloy_primitives::{Address, Bytes};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::{
    constants::{ARTIFACT_EXTENSION, DEPLOYMENTS_KEY},
    errors::ScriptError,
    types::{ContractName, Wallet},
};

/// Parse the deployer's private key
pub fn parse_signer(priv_key: &str) -> Result<PrivateKeySigner, ScriptError> {
    PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
}

/// Sets up the signer-backed client deployments are submitted through,
/// checking connectivity by fetching the chain ID.
pub async fn setup_client(signer: PrivateKeySigner, rpc_url: &str) -> Result<Wallet, ScriptError> {
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let deployer_address = signer.address();
    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    info!(
        "Connected to chain {} as deployer {:#x}",
        chain_id, deployer_address
    );

    Ok(DynProvider::new(provider))
}

// -------------
// | Artifacts |
// -------------

/// The subset of a compilation artifact the scripts read
#[derive(Deserialize)]
struct Artifact {
    /// The creation bytecode
    bytecode: ArtifactBytecode,
}

/// Creation bytecode in either of the common artifact shapes
#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactBytecode {
    /// Hardhat: `"bytecode": "0x..."`
    Hex(Bytes),
    /// Foundry: `"bytecode": { "object": "0x..." }`
    Object {
        /// The bytecode itself
        object: Bytes,
    },
}

/// The path of a contract's artifact within the artifacts directory
pub fn artifact_path(artifacts_dir: &Path, name: ContractName) -> PathBuf {
    artifacts_dir
        .join(name.artifact_name())
        .with_extension(ARTIFACT_EXTENSION)
}

/// Read the creation bytecode of a contract from its compilation artifact
pub fn read_artifact_bytecode(
    artifacts_dir: &Path,
    name: ContractName,
) -> Result<Bytes, ScriptError> {
    let path = artifact_path(artifacts_dir, name);
    let contents = fs::read_to_string(&path)
        .map_err(|e| ScriptError::ReadFile(format!("{}: {}", path.display(), e)))?;
    parse_artifact_bytecode(&contents)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))
}

/// Extract the creation bytecode from the contents of an artifact
fn parse_artifact_bytecode(contents: &str) -> Result<Bytes, String> {
    let artifact: Artifact = serde_json::from_str(contents).map_err(|e| e.to_string())?;
    let bytecode = match artifact.bytecode {
        ArtifactBytecode::Hex(bytes) | ArtifactBytecode::Object { object: bytes } => bytes,
    };

    if bytecode.is_empty() {
        return Err("artifact has empty bytecode".to_string());
    }
    Ok(bytecode)
}

// ---------------
// | Deployments |
// ---------------

/// Read a JSON file
pub fn get_json_from_file(file_path: &Path) -> Result<Value, ScriptError> {
    let contents = fs::read_to_string(file_path)
        .map_err(|e| ScriptError::ReadFile(format!("{}: {}", file_path.display(), e)))?;
    serde_json::from_str(&contents).map_err(|e| ScriptError::Serde(e.to_string()))
}

/// Read a deployed address back from the deployments file
pub fn parse_addr_from_deployments_file(
    file_path: &Path,
    contract_key: &str,
) -> Result<Address, ScriptError> {
    let parsed_json = get_json_from_file(file_path)?;
    let addr_str = parsed_json[DEPLOYMENTS_KEY][contract_key]
        .as_str()
        .ok_or_else(|| {
            ScriptError::ReadFile(format!(
                "no `{}` address in deployments file",
                contract_key
            ))
        })?;

    Address::from_str(addr_str).map_err(|e| ScriptError::ReadFile(e.to_string()))
}

/// Record a deployed address in the deployments file, creating it if needed
pub fn write_deployed_address(
    file_path: &Path,
    contract_key: &str,
    address: Address,
) -> Result<(), ScriptError> {
    let mut parsed_json = if file_path.exists() {
        get_json_from_file(file_path)?
    } else {
        Value::Object(Default::default())
    };

    if !parsed_json.is_object() {
        return Err(ScriptError::WriteFile(format!(
            "{} does not hold a JSON object",
            file_path.display()
        )));
    }
    parsed_json[DEPLOYMENTS_KEY][contract_key] = Value::String(format!("{address:#x}"));

    let contents = serde_json::to_string_pretty(&parsed_json)
        .map_err(|e| ScriptError::Serde(e.to_string()))?;
    fs::write(file_path, contents).map_err(|e| ScriptError::WriteFile(e.to_string()))
}

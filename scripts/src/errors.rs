//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use alloy_primitives::Address;

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum ScriptError {
    /// The router parameter file is malformed or incomplete
    ConfigurationError(String),
    /// A deployment transaction failed to send, reverted, or left no code behind
    DeploymentFailure(String),
    /// A CREATE2 deployment targets an address that already holds code
    AddressCollision(Address),
    /// The address of a prerequisite contract could not be obtained
    DependencyUnavailable(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error fetching the nonce of the deployer
    NonceFetching(String),
    /// Error parsing a compilation artifact
    ArtifactParsing(String),
    /// Error reading a file
    ReadFile(String),
    /// Error writing a file
    WriteFile(String),
    /// Error de/serializing JSON
    Serde(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ConfigurationError(s) => write!(f, "configuration error: {}", s),
            ScriptError::DeploymentFailure(s) => write!(f, "deployment failure: {}", s),
            ScriptError::AddressCollision(addr) => {
                write!(f, "CREATE2 address collision: {:#x} already has code", addr)
            }
            ScriptError::DependencyUnavailable(s) => write!(f, "dependency unavailable: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::NonceFetching(s) => write!(f, "error fetching nonce: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ReadFile(s) => write!(f, "error reading file: {}", s),
            ScriptError::WriteFile(s) => write!(f, "error writing file: {}", s),
            ScriptError::Serde(s) => write!(f, "error de/serializing JSON: {}", s),
        }
    }
}

impl Error for ScriptError {}

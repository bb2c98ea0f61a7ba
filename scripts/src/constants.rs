//! Constants used in the deploy scripts

use alloy_primitives::{address, b256, Address, B256};

/// The CREATE2 salt of the canonical WETH9 deployment
pub const WETH9_SALT: B256 =
    b256!("0x0000000000000000000000000000000000000000000000000000000000000001");

/// The CREATE2 salt of the canonical Permit2 deployment
pub const PERMIT2_SALT: B256 =
    b256!("0x0000000000000000000000000000000000000000000000000000000000000001");

/// The CREATE2 salt of the UniversalRouter deployment
pub const ROUTER_SALT: B256 =
    b256!("0x0000000000000000000000000000000000000000000000000000000000000001");

/// The deterministic deployment proxy used as the CREATE2 factory.
///
/// Calldata is `salt ++ init_code`, see https://github.com/Arachnid/deterministic-deployment-proxy
pub const DEFAULT_CREATE2_FACTORY: Address = address!("0x4e59b44847b379578588920ca78fbf26c0b4956c");

/// The number of confirmations to wait for a deployment transaction
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// The default directory holding compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The default router parameters file
pub const DEFAULT_ROUTER_PARAMS_PATH: &str = "routerParams/example.json";

/// The default file deployed addresses are written to
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The deployments key in the `deployments.json` file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The extension of a compilation artifact
pub const ARTIFACT_EXTENSION: &str = "json";

/// The length of a `0x`-prefixed address string
pub const ADDRESS_HEX_LEN: usize = 42;

/// The length of a `0x`-prefixed 32-byte hash string
pub const HASH_HEX_LEN: usize = 66;

/// The number of bytes in a `bytes32` value
pub const NUM_BYTES_HASH: usize = 32;

use std::{
    cell::{Cell, RefCell},
    env, fs,
    path::PathBuf,
};

use alloy::dyn_abi::DynSolValue;
use alloy_primitives::{address, keccak256, Address};
use eyre::Result;
use router_scripts::{
    commands::{deploy_router, run_plan},
    constants::{DEFAULT_CREATE2_FACTORY, ROUTER_SALT},
    deployer::{
        build_init_code, predict_create2_address, predict_create_address, ContractDeployer,
    },
    errors::ScriptError,
    params::{AddressSlot, HashSlot, SlotValue},
    types::{
        ContractName, DeployOptions, DeployedContract, DeploymentContext, DeploymentMode,
        DeploymentPlan,
    },
};

const DEPLOYER: Address = address!("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
const PERMIT2: Address = address!("0x000000000022d473030f116ddee9f6b43ac78ba3");
const PAIR_HASH: &str = "0x96e8ac4277198ff8b6f785478aa9a39f403cb768dd02cbee326c3e7da348845f";
const POOL_HASH: &str = "0xe34f199b19b2b4f47f68442619d555527d244f78a3297ea89325f843f87b8b54";

// -----------------
// | Mock Deployer |
// -----------------

/// A deployer that predicts addresses locally and records every submission
struct MockDeployer {
    /// The deployer's next nonce
    nonce: Cell<u64>,
    /// A contract whose deployment fails, if any
    fail_on: Option<ContractName>,
    /// A contract reported at a fixed address instead of its predicted one
    reported_address: Option<(ContractName, Address)>,
    /// The deployments submitted so far
    submitted: RefCell<Vec<(ContractName, DeploymentMode, Vec<DynSolValue>)>>,
}

impl MockDeployer {
    fn new() -> Self {
        Self {
            nonce: Cell::new(0),
            fail_on: None,
            reported_address: None,
            submitted: RefCell::new(Vec::new()),
        }
    }

    fn failing_on(name: ContractName) -> Self {
        Self {
            fail_on: Some(name),
            ..Self::new()
        }
    }

    fn reporting(name: ContractName, address: Address) -> Self {
        Self {
            reported_address: Some((name, address)),
            ..Self::new()
        }
    }

    fn submitted_names(&self) -> Vec<ContractName> {
        self.submitted.borrow().iter().map(|(name, ..)| *name).collect()
    }
}

impl ContractDeployer for MockDeployer {
    async fn deploy_contract(
        &self,
        name: ContractName,
        mode: DeploymentMode,
        constructor_args: &[DynSolValue],
        _options: &DeployOptions,
    ) -> Result<DeployedContract, ScriptError> {
        if self.fail_on == Some(name) {
            return Err(ScriptError::DeploymentFailure(
                "insufficient funds for gas * price + value".to_string(),
            ));
        }

        self.submitted
            .borrow_mut()
            .push((name, mode, constructor_args.to_vec()));
        let nonce = self.nonce.get();
        self.nonce.set(nonce + 1);

        let address = match (mode, self.reported_address) {
            (_, Some((reported, address))) if reported == name => address,
            (DeploymentMode::Create, _) => predict_create_address(DEPLOYER, nonce),
            (DeploymentMode::Create2 { salt }, _) => {
                let init_code = build_init_code(name.artifact_name().as_bytes(), constructor_args);
                predict_create2_address(DEFAULT_CREATE2_FACTORY, salt, &init_code)
            }
        };

        Ok(DeployedContract {
            name,
            address,
            mode,
            constructor_args: constructor_args.to_vec(),
            tx_hash: keccak256(nonce.to_be_bytes()),
        })
    }
}

// -----------
// | Helpers |
// -----------

/// Write a parameter file with every protocol unsupported except Permit2,
/// leaving out the given slots
fn write_params(test_name: &str, omit: &[&str]) -> Result<PathBuf> {
    let mut entries: Vec<String> = AddressSlot::ALL
        .iter()
        .map(|slot| {
            let address = if *slot == AddressSlot::Permit2 {
                PERMIT2
            } else {
                Address::ZERO
            };
            (slot.key(), format!("{address:#x}"))
        })
        .chain([
            ("pairInitCodeHash", PAIR_HASH.to_string()),
            ("poolInitCodeHash", POOL_HASH.to_string()),
        ])
        .filter(|(key, _)| !omit.contains(key))
        .map(|(key, value)| format!("  \"{key}\": \"{value}\""))
        .collect();
    entries.sort();

    let path = env::temp_dir().join(format!(
        "router-params-{}-{}.json",
        test_name,
        std::process::id()
    ));
    fs::write(&path, format!("{{\n{}\n}}", entries.join(",\n")))?;
    Ok(path)
}

/// A deployment context reading parameters from `params_path`
fn context(params_path: PathBuf) -> DeploymentContext {
    DeploymentContext {
        options: DeployOptions::default(),
        params_path,
        deployments_path: None,
    }
}

// ---------
// | Tests |
// ---------

#[tokio::test]
async fn test_router_plan_resolves_against_stand_in() -> Result<()> {
    let params_path = write_params("happy", &[])?;
    let deployer = MockDeployer::new();

    let deployment = deploy_router(&deployer, &context(params_path.clone())).await?;
    fs::remove_file(params_path)?;

    // The stand-in is the deployer's first CREATE
    let stand_in = predict_create_address(DEPLOYER, 0);
    assert_eq!(deployment.unsupported.address, stand_in);
    assert_eq!(deployment.unsupported.mode, DeploymentMode::Create);

    for slot in AddressSlot::ALL {
        let expected = if slot == AddressSlot::Permit2 {
            PERMIT2
        } else {
            stand_in
        };
        assert_eq!(
            deployment.params.address(slot),
            Some(SlotValue::Address(expected))
        );
    }
    assert_eq!(
        deployment.params.hash(HashSlot::PairInitCodeHash),
        Some(PAIR_HASH.parse()?)
    );

    // The router goes through CREATE2 with the resolved set as its only argument
    assert_eq!(
        deployment.router.mode,
        DeploymentMode::Create2 { salt: ROUTER_SALT }
    );
    assert_eq!(
        deployment.router.constructor_args,
        vec![deployment.params.to_constructor_arg()?]
    );
    assert_eq!(
        deployer.submitted_names(),
        vec![ContractName::UnsupportedProtocol, ContractName::UniversalRouter]
    );

    Ok(())
}

#[tokio::test]
async fn test_router_address_stable_across_runs() -> Result<()> {
    let params_path = write_params("stable", &[])?;
    let ctx = context(params_path.clone());

    let first = deploy_router(&MockDeployer::new(), &ctx).await?;
    let second = deploy_router(&MockDeployer::new(), &ctx).await?;
    fs::remove_file(params_path)?;

    assert_eq!(first.router.address, second.router.address);
    Ok(())
}

#[tokio::test]
async fn test_stand_in_failure_aborts_plan() -> Result<()> {
    let params_path = write_params("stand-in-fails", &[])?;
    let deployer = MockDeployer::failing_on(ContractName::UnsupportedProtocol);

    let err = deploy_router(&deployer, &context(params_path.clone()))
        .await
        .unwrap_err();
    fs::remove_file(params_path)?;

    assert!(matches!(err, ScriptError::DeploymentFailure(_)));
    assert!(deployer.submitted_names().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_slot_deploys_nothing() -> Result<()> {
    let params_path = write_params("missing-seaport", &["seaport"])?;
    let deployer = MockDeployer::new();

    let err = deploy_router(&deployer, &context(params_path.clone()))
        .await
        .unwrap_err();
    fs::remove_file(params_path)?;

    match err {
        ScriptError::ConfigurationError(msg) => assert!(msg.contains("seaport")),
        other => panic!("unexpected error: {other}"),
    }
    // The file is checked before the stand-in goes out
    assert!(deployer.submitted_names().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_hash_deploys_nothing() -> Result<()> {
    let params_path = write_params("missing-pool-hash", &["poolInitCodeHash"])?;
    let deployer = MockDeployer::new();

    let err = deploy_router(&deployer, &context(params_path.clone()))
        .await
        .unwrap_err();
    fs::remove_file(params_path)?;

    assert!(matches!(err, ScriptError::ConfigurationError(_)));
    assert!(deployer.submitted_names().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_malformed_params_deploy_nothing() -> Result<()> {
    let params_path = env::temp_dir().join(format!(
        "router-params-malformed-{}.json",
        std::process::id()
    ));
    fs::write(&params_path, r#"{ "permit2": "0x1234" }"#)?;
    let deployer = MockDeployer::new();

    let err = deploy_router(&deployer, &context(params_path.clone()))
        .await
        .unwrap_err();
    fs::remove_file(params_path)?;

    assert!(matches!(err, ScriptError::ConfigurationError(_)));
    assert!(deployer.submitted_names().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_params_file_deploys_nothing() -> Result<()> {
    let deployer = MockDeployer::new();

    let err = deploy_router(&deployer, &context(PathBuf::from("does-not-exist.json")))
        .await
        .unwrap_err();

    assert!(matches!(err, ScriptError::ConfigurationError(_)));
    assert!(deployer.submitted_names().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_zero_stand_in_address_stops_before_router() -> Result<()> {
    let params_path = write_params("zero-stand-in", &[])?;
    let deployer = MockDeployer::reporting(ContractName::UnsupportedProtocol, Address::ZERO);

    let err = deploy_router(&deployer, &context(params_path.clone()))
        .await
        .unwrap_err();
    fs::remove_file(params_path)?;

    assert!(matches!(err, ScriptError::DependencyUnavailable(_)));
    assert_eq!(
        deployer.submitted_names(),
        vec![ContractName::UnsupportedProtocol]
    );
    Ok(())
}

#[tokio::test]
async fn test_router_failure_surfaces_error() -> Result<()> {
    let params_path = write_params("router-fails", &[])?;
    let deployer = MockDeployer::failing_on(ContractName::UniversalRouter);

    let err = deploy_router(&deployer, &context(params_path.clone()))
        .await
        .unwrap_err();
    fs::remove_file(params_path)?;

    assert!(matches!(err, ScriptError::DeploymentFailure(_)));
    assert_eq!(
        deployer.submitted_names(),
        vec![ContractName::UnsupportedProtocol]
    );
    Ok(())
}

#[tokio::test]
async fn test_base_plans() -> Result<()> {
    let ctx = context(PathBuf::from("unused.json"));

    let deployer = MockDeployer::new();
    let base = run_plan(DeploymentPlan::Base, &deployer, &ctx).await?;
    assert_eq!(deployer.submitted_names(), vec![ContractName::Weth9]);

    let deployer = MockDeployer::new();
    let with_permit2 = run_plan(DeploymentPlan::BaseWithPermit2, &deployer, &ctx).await?;
    assert_eq!(
        deployer.submitted_names(),
        vec![ContractName::Weth9, ContractName::Permit2]
    );

    // WETH9 lands at the same address under either plan
    assert_eq!(base[0].address, with_permit2[0].address);
    assert!(with_permit2
        .iter()
        .all(|c| matches!(c.mode, DeploymentMode::Create2 { .. })));
    Ok(())
}

#[tokio::test]
async fn test_base_plan_stops_on_failure() -> Result<()> {
    let ctx = context(PathBuf::from("unused.json"));
    let deployer = MockDeployer::failing_on(ContractName::Weth9);

    let res = run_plan(DeploymentPlan::BaseWithPermit2, &deployer, &ctx).await;

    assert!(res.is_err());
    assert!(deployer.submitted_names().is_empty());
    Ok(())
}

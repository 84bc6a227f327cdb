#![allow(clippy::unwrap_used)]

use std::{sync::Mutex, time::Duration};

use bridge_bootstrap::deployer::{
    BootstrapConfig, BootstrapCoordinator, BootstrapState, Clock, DeployerError, FundingOutcome,
    ManifestWriter, funding::FundingPlan, topology::BridgeConfig,
};
use bridge_common::{
    Address,
    calldata::compute_function_selector,
    genesis::ConsensusGenesis,
    networks::Network,
    types::{DeploymentTarget, EmergencyAuthority},
    utils::{to_checksum_address, units_to_wei},
};
use bridge_rpc::test_utils::MockChain;
use bridge_sdk::test_utils::{MockArtifacts, RecordingRegistrar};
use bytes::Bytes;

const OPERATOR: Address = Address::repeat_byte(0x0a);
const LOCAL_CHAIN_ID: u64 = 31337;

const ROLES: [&str; 22] = [
    "ProxyAdmin",
    "GovHub",
    "CrossChain",
    "TokenHub",
    "LightClient",
    "RelayerHub",
    "BucketHub",
    "ObjectHub",
    "GroupHub",
    "PermissionHub",
    "MultiMessage",
    "GreenfieldExecutor",
    "ZkmeSBTHub",
    "AdditionalBucketHub",
    "AdditionalObjectHub",
    "AdditionalGroupHub",
    "AdditionalPermissionHub",
    "BucketERC721Token",
    "ObjectERC721Token",
    "GroupERC721Token",
    "PermissionERC721Token",
    "MemberERC1155Token",
];

#[derive(Default)]
struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
}

#[async_trait::async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

fn config(network: Network, chain_id: u64, authority: EmergencyAuthority) -> BootstrapConfig {
    BootstrapConfig {
        target: DeploymentTarget::new(chain_id, network.name(), network.is_production()),
        authority,
        genesis: ConsensusGenesis::from_json(network.genesis_contents()).unwrap(),
        bridge: BridgeConfig {
            remote_chain_id: 5151,
            cross_chain_transfer_enabled: true,
            executor_contract: network.executor_contract().to_owned(),
        },
        funding: FundingPlan {
            token_hub: units_to_wei(1),
            relayers: vec![],
            relayer_amount: units_to_wei(100),
        },
        commit_id: "0123456789abcdef".to_owned(),
    }
}

struct Harness {
    chain: MockChain,
    artifacts: MockArtifacts,
    registrar: RecordingRegistrar,
    clock: RecordingClock,
    dir: tempfile::TempDir,
}

impl Harness {
    fn new(chain_id: u64) -> Self {
        Self {
            chain: MockChain::new(chain_id, OPERATOR),
            artifacts: MockArtifacts::new(),
            registrar: RecordingRegistrar::new(),
            clock: RecordingClock::default(),
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn writer(&self) -> ManifestWriter {
        ManifestWriter::new(self.dir.path().join("deployment"))
    }

    fn coordinator(&self) -> BootstrapCoordinator<'_> {
        BootstrapCoordinator::new(
            &self.chain,
            &self.artifacts,
            &self.registrar,
            &self.clock,
            self.writer(),
        )
    }
}

#[tokio::test]
async fn fresh_local_run_writes_a_complete_manifest() {
    let harness = Harness::new(LOCAL_CHAIN_ID);
    let mut coordinator = harness.coordinator();

    let outcome = coordinator
        .run(&config(Network::Local, LOCAL_CHAIN_ID, EmergencyAuthority::default()))
        .await
        .unwrap();

    assert_eq!(coordinator.state(), &BootstrapState::ManifestWritten);
    assert_eq!(
        outcome.manifest_path,
        harness.dir.path().join("deployment").join("31337-deployment.json")
    );

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&outcome.manifest_path).unwrap()).unwrap();
    for role in ROLES {
        let address = json[role].as_str().unwrap_or_else(|| panic!("{role} missing"));
        assert_eq!(address.len(), 42, "{role}");
        assert_ne!(address, to_checksum_address(&Address::zero()), "{role}");
    }
    assert_eq!(json["DeployCommitId"], "0123456789abcdef");
    assert_eq!(json["EmergencyOperator"], to_checksum_address(&OPERATOR));
    assert_eq!(json["EmergencyUpgradeOperator"], to_checksum_address(&OPERATOR));
    assert_eq!(json["gnfdChainId"], 5151);
    assert_eq!(json["enableCrossChainTransfer"], true);
    assert_eq!(json["initConsensusState"]["chainID"], "mechain_5151-1");

    // Umbrella deployer plus 21 implementations and tokens, each once.
    assert_eq!(harness.chain.deployments().len(), 22);
    assert!(harness.clock.sleeps.lock().unwrap().is_empty());
}

#[tokio::test]
async fn activation_is_a_single_positional_call() {
    let harness = Harness::new(LOCAL_CHAIN_ID);
    let outcome = harness
        .coordinator()
        .run(&config(Network::Local, LOCAL_CHAIN_ID, EmergencyAuthority::default()))
        .await
        .unwrap();

    let umbrella = outcome.manifest.deployer.0;
    let calls = harness.chain.contract_calls();
    assert_eq!(calls.len(), 1);
    let (to, calldata) = &calls[0];
    assert_eq!(*to, umbrella);
    assert_eq!(
        calldata[..4],
        compute_function_selector("deploy(address[],bytes)").unwrap()
    );

    // Array length word, then the first slot: the GovHub implementation.
    assert_eq!(calldata[4 + 64 + 31], 21);
    let govhub_impl = &outcome.deployed[1];
    assert_eq!(govhub_impl.identifier, "GovHub");
    assert_eq!(&calldata[4 + 96 + 12..4 + 128], govhub_impl.address.as_bytes());
}

#[tokio::test]
async fn non_production_run_funds_the_token_hub() {
    let harness = Harness::new(LOCAL_CHAIN_ID);
    let outcome = harness
        .coordinator()
        .run(&config(Network::Local, LOCAL_CHAIN_ID, EmergencyAuthority::default()))
        .await
        .unwrap();

    let token_hub = outcome.manifest.contract("TokenHub").unwrap();
    assert_eq!(
        harness.chain.value_transfers(),
        vec![(token_hub, units_to_wei(1))]
    );
    let FundingOutcome::Completed(report) = outcome.funding else {
        panic!("funding should run outside production");
    };
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn production_without_emergency_operator_is_rejected() {
    let harness = Harness::new(56);
    let mut coordinator = harness.coordinator();
    let multisig = Address::repeat_byte(0x5a);
    harness
        .chain
        .set_code(multisig, Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]));

    let result = coordinator
        .run(&config(
            Network::Bsc,
            56,
            EmergencyAuthority::new(None, Some(multisig)),
        ))
        .await;

    assert!(matches!(result, Err(DeployerError::Configuration(_))));
    assert!(matches!(coordinator.state(), BootstrapState::Failed(_)));
    assert!(harness.chain.sent_transactions().is_empty());
    assert!(!harness.dir.path().join("deployment").exists());
}

#[tokio::test]
async fn production_authorities_without_code_deploy_nothing() {
    let harness = Harness::new(56);
    let mut coordinator = harness.coordinator();
    let eoa = Address::repeat_byte(0xe0);

    let result = coordinator
        .run(&config(Network::Bsc, 56, EmergencyAuthority::new(Some(eoa), Some(eoa))))
        .await;

    assert!(matches!(result, Err(DeployerError::SafetyViolation(_))));
    assert_eq!(harness.chain.send_attempts(), 0);
    assert_eq!(harness.artifacts.compilations(), 0);
    assert!(harness.artifacts.requests().is_empty());
}

#[tokio::test]
async fn production_run_never_funds() {
    let harness = Harness::new(56);
    let operator = Address::repeat_byte(0x5a);
    let upgrade_operator = Address::repeat_byte(0x5b);
    for authority in [operator, upgrade_operator] {
        harness
            .chain
            .set_code(authority, Bytes::from_static(&[0x60, 0x80, 0x60, 0x40, 0x52]));
    }
    let mut coordinator = harness.coordinator();

    let outcome = coordinator
        .run(&config(
            Network::Bsc,
            56,
            EmergencyAuthority::new(Some(operator), Some(upgrade_operator)),
        ))
        .await
        .unwrap();

    assert!(coordinator.transitions().contains(&BootstrapState::Activated));
    assert_eq!(outcome.funding, FundingOutcome::Skipped);
    assert!(harness.chain.value_transfers().is_empty());
    assert_eq!(outcome.manifest.emergency_operator.0, operator);
    assert_eq!(outcome.manifest.emergency_upgrade_operator.0, upgrade_operator);

    let registration = &harness.registrar.registrations()[0];
    assert_eq!(registration["EMERGENCY_OPERATOR"], operator);
    assert_eq!(registration["EMERGENCY_UPGRADE_OPERATOR"], upgrade_operator);
}

#[tokio::test]
async fn rerun_overwrites_the_previous_manifest() {
    let harness = Harness::new(LOCAL_CHAIN_ID);
    let config = config(Network::Local, LOCAL_CHAIN_ID, EmergencyAuthority::default());

    let first = harness.coordinator().run(&config).await.unwrap();
    let second = harness.coordinator().run(&config).await.unwrap();

    // Same path, fresh contracts: nothing guards against the overwrite.
    assert_eq!(first.manifest_path, second.manifest_path);
    assert_ne!(first.manifest.deployer, second.manifest.deployer);
    assert_ne!(
        first.manifest.contract("GovHub"),
        second.manifest.contract("GovHub")
    );
    assert_eq!(harness.writer().read(LOCAL_CHAIN_ID).unwrap(), second.manifest);
    assert_eq!(harness.chain.deployments().len(), 44);
    assert_eq!(
        std::fs::read_dir(harness.dir.path().join("deployment"))
            .unwrap()
            .count(),
        1
    );
}

#[tokio::test]
async fn reverted_activation_fails_without_manifest() {
    let harness = Harness::new(LOCAL_CHAIN_ID);
    // The umbrella deployer is the first contract the operator creates.
    let umbrella = bridge_rpc::test_utils::create_address(OPERATOR, 0);
    harness.chain.revert_calls_to(umbrella);
    let mut coordinator = harness.coordinator();

    let result = coordinator
        .run(&config(Network::Local, LOCAL_CHAIN_ID, EmergencyAuthority::default()))
        .await;

    assert!(matches!(
        &result,
        Err(DeployerError::Contract { contract, .. }) if contract == "Deployer"
    ));
    assert_eq!(
        coordinator.transitions().last(),
        Some(&BootstrapState::Failed(
            result.unwrap_err().to_string()
        ))
    );
    assert!(!harness.writer().path_for(LOCAL_CHAIN_ID).exists());
    assert!(harness.chain.value_transfers().is_empty());
}

#[tokio::test]
async fn zero_proxy_address_stops_before_registration() {
    let harness = Harness::new(LOCAL_CHAIN_ID);
    let umbrella = bridge_rpc::test_utils::create_address(OPERATOR, 0);
    let selector = compute_function_selector("proxyTokenHub()").unwrap();
    harness.chain.set_call_result(
        umbrella,
        Bytes::copy_from_slice(&selector),
        Bytes::from(vec![0u8; 32]),
    );
    let mut coordinator = harness.coordinator();

    let result = coordinator
        .run(&config(Network::Local, LOCAL_CHAIN_ID, EmergencyAuthority::default()))
        .await;

    assert!(matches!(
        &result,
        Err(DeployerError::Contract { reason, .. }) if reason.contains("proxyTokenHub()")
    ));
    assert!(harness.registrar.registrations().is_empty());
    assert_eq!(harness.chain.deployments().len(), 1);
}

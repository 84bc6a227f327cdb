//! Fixed contract topology of the bridge.
//!
//! The umbrella `Deployer` allocates every proxy up front; implementations
//! and tokens are deployed afterwards and handed back to it, in a fixed
//! positional order, by the single activation call.

use std::collections::HashSet;

use bridge_common::{Address, U256, calldata::Value};
use indexmap::IndexMap;

use super::retry::DeployedContract;

pub const UMBRELLA_DEPLOYER: &str = "Deployer";
pub const ACTIVATION_SIGNATURE: &str = "deploy(address[],bytes)";
pub const ERC721_TOKEN: &str = "ERC721NonTransferable";
pub const ERC1155_TOKEN: &str = "ERC1155NonTransferable";

pub const EMERGENCY_OPERATOR_CONSTANT: &str = "EMERGENCY_OPERATOR";
pub const EMERGENCY_UPGRADE_OPERATOR_CONSTANT: &str = "EMERGENCY_UPGRADE_OPERATOR";

/// Proxies allocated by the umbrella deployer, in getter order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyRole {
    ProxyAdmin,
    GovHub,
    CrossChain,
    TokenHub,
    LightClient,
    RelayerHub,
    BucketHub,
    ObjectHub,
    GroupHub,
    PermissionHub,
    MultiMessage,
    Executor,
    ZkmeSBTHub,
}

impl ProxyRole {
    pub const ALL: [ProxyRole; 13] = [
        ProxyRole::ProxyAdmin,
        ProxyRole::GovHub,
        ProxyRole::CrossChain,
        ProxyRole::TokenHub,
        ProxyRole::LightClient,
        ProxyRole::RelayerHub,
        ProxyRole::BucketHub,
        ProxyRole::ObjectHub,
        ProxyRole::GroupHub,
        ProxyRole::PermissionHub,
        ProxyRole::MultiMessage,
        ProxyRole::Executor,
        ProxyRole::ZkmeSBTHub,
    ];

    /// Role name used in the manifest. The executor proxy is named after
    /// the executor contract of the network.
    pub fn name(self, executor: &str) -> String {
        let name = match self {
            ProxyRole::ProxyAdmin => "ProxyAdmin",
            ProxyRole::GovHub => "GovHub",
            ProxyRole::CrossChain => "CrossChain",
            ProxyRole::TokenHub => "TokenHub",
            ProxyRole::LightClient => "LightClient",
            ProxyRole::RelayerHub => "RelayerHub",
            ProxyRole::BucketHub => "BucketHub",
            ProxyRole::ObjectHub => "ObjectHub",
            ProxyRole::GroupHub => "GroupHub",
            ProxyRole::PermissionHub => "PermissionHub",
            ProxyRole::MultiMessage => "MultiMessage",
            ProxyRole::Executor => executor,
            ProxyRole::ZkmeSBTHub => "ZkmeSBTHub",
        };
        name.to_owned()
    }

    /// View function on the umbrella deployer returning this proxy.
    pub fn getter(self, executor: &str) -> String {
        match self {
            ProxyRole::ProxyAdmin => "proxyAdmin()".to_owned(),
            role => format!("proxy{}()", role.name(executor)),
        }
    }

    /// Constant in `Config.sol` holding this proxy's address.
    pub fn config_constant(self, executor: &str) -> String {
        to_constant_case(&self.name(executor))
    }
}

/// Contracts deployed after the proxies, one per activation slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicRole {
    GovHub,
    CrossChain,
    TokenHub,
    LightClient,
    RelayerHub,
    BucketHub,
    ObjectHub,
    GroupHub,
    PermissionHub,
    MultiMessage,
    Executor,
    ZkmeSBTHub,
    AdditionalBucketHub,
    AdditionalObjectHub,
    AdditionalGroupHub,
    AdditionalPermissionHub,
    BucketToken,
    ObjectToken,
    GroupToken,
    PermissionToken,
    MemberToken,
}

/// Positional contract of `deploy(address[],bytes)`. Position is semantic:
/// the umbrella deployer installs slot `i` behind a fixed proxy.
pub const ACTIVATION_ORDER: [LogicRole; 21] = [
    LogicRole::GovHub,
    LogicRole::CrossChain,
    LogicRole::TokenHub,
    LogicRole::LightClient,
    LogicRole::RelayerHub,
    LogicRole::BucketHub,
    LogicRole::ObjectHub,
    LogicRole::GroupHub,
    LogicRole::AdditionalBucketHub,
    LogicRole::AdditionalObjectHub,
    LogicRole::AdditionalGroupHub,
    LogicRole::BucketToken,
    LogicRole::ObjectToken,
    LogicRole::GroupToken,
    LogicRole::MemberToken,
    LogicRole::PermissionHub,
    LogicRole::AdditionalPermissionHub,
    LogicRole::PermissionToken,
    LogicRole::MultiMessage,
    LogicRole::Executor,
    LogicRole::ZkmeSBTHub,
];

impl LogicRole {
    /// Manifest key for roles recorded there. Hub implementations are only
    /// reachable through their proxies and are not recorded.
    pub fn manifest_key(self) -> Option<&'static str> {
        match self {
            LogicRole::AdditionalBucketHub => Some("AdditionalBucketHub"),
            LogicRole::AdditionalObjectHub => Some("AdditionalObjectHub"),
            LogicRole::AdditionalGroupHub => Some("AdditionalGroupHub"),
            LogicRole::AdditionalPermissionHub => Some("AdditionalPermissionHub"),
            LogicRole::BucketToken => Some("BucketERC721Token"),
            LogicRole::ObjectToken => Some("ObjectERC721Token"),
            LogicRole::GroupToken => Some("GroupERC721Token"),
            LogicRole::PermissionToken => Some("PermissionERC721Token"),
            LogicRole::MemberToken => Some("MemberERC1155Token"),
            _ => None,
        }
    }
}

/// Converts `ZkmeSBTHub` into `ZKME_SBT_HUB`.
fn to_constant_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev_lower = chars[i - 1].is_ascii_lowercase();
            let acronym_end = chars[i - 1].is_ascii_uppercase()
                && chars.get(i + 1).is_some_and(|next| next.is_ascii_lowercase());
            if prev_lower || acronym_end {
                out.push('_');
            }
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub remote_chain_id: u64,
    pub cross_chain_transfer_enabled: bool,
    pub executor_contract: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorArg {
    Literal(Value),
    /// Address of a proxy allocated by the umbrella deployer.
    Proxy(ProxyRole),
    /// Address of a contract deployed earlier in the logic phase.
    Logic(LogicRole),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSpec {
    pub identifier: String,
    pub constructor_args: Vec<ConstructorArg>,
}

impl ContractSpec {
    fn new(identifier: impl Into<String>, constructor_args: Vec<ConstructorArg>) -> Self {
        Self {
            identifier: identifier.into(),
            constructor_args,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("{contract} references {reference}, which is not resolved before it")]
    ForwardReference { contract: String, reference: String },
    #[error("{0:?} is deployed more than once")]
    DuplicateRole(LogicRole),
    #[error("Activation takes {expected} addresses, plan has {actual}")]
    ActivationLength { expected: usize, actual: usize },
    #[error("Activation slot {position} expects {expected:?}, plan has {actual:?}")]
    ActivationOrder {
        position: usize,
        expected: LogicRole,
        actual: LogicRole,
    },
    #[error("Proxy {0:?} was not resolved")]
    UnresolvedProxy(ProxyRole),
    #[error("{0:?} was not deployed")]
    UnresolvedLogic(LogicRole),
}

/// Addresses resolved so far in a run.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAddresses {
    pub proxies: IndexMap<ProxyRole, Address>,
    pub logic: IndexMap<LogicRole, DeployedContract>,
}

impl ResolvedAddresses {
    pub fn proxy(&self, role: ProxyRole) -> Result<Address, PlanError> {
        self.proxies
            .get(&role)
            .copied()
            .ok_or(PlanError::UnresolvedProxy(role))
    }

    pub fn logic(&self, role: LogicRole) -> Result<Address, PlanError> {
        self.logic
            .get(&role)
            .map(|deployed| deployed.address)
            .ok_or(PlanError::UnresolvedLogic(role))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPlan {
    pub umbrella: ContractSpec,
    pub proxies: Vec<ProxyRole>,
    pub logic: Vec<(LogicRole, ContractSpec)>,
    pub activation_order: Vec<LogicRole>,
    pub executor_contract: String,
}

pub fn plan(config: &BridgeConfig) -> DeploymentPlan {
    use ConstructorArg::{Literal, Proxy};

    let executor = config.executor_contract.clone();
    let implementation =
        |role: LogicRole, identifier: &str| (role, ContractSpec::new(identifier, vec![]));
    let erc721 = |role: LogicRole, name: &str, symbol: &str, segment: &str, hub: ProxyRole| {
        (
            role,
            ContractSpec::new(
                ERC721_TOKEN,
                vec![
                    Literal(Value::String(name.to_owned())),
                    Literal(Value::String(symbol.to_owned())),
                    Literal(Value::String(segment.to_owned())),
                    Proxy(hub),
                ],
            ),
        )
    };

    let logic = vec![
        implementation(LogicRole::GovHub, "GovHub"),
        implementation(LogicRole::CrossChain, "CrossChain"),
        implementation(LogicRole::TokenHub, "TokenHub"),
        implementation(LogicRole::LightClient, "GnfdLightClient"),
        implementation(LogicRole::RelayerHub, "RelayerHub"),
        implementation(LogicRole::BucketHub, "BucketHub"),
        implementation(LogicRole::ObjectHub, "ObjectHub"),
        implementation(LogicRole::GroupHub, "GroupHub"),
        implementation(LogicRole::PermissionHub, "PermissionHub"),
        implementation(LogicRole::MultiMessage, "MultiMessage"),
        implementation(LogicRole::Executor, &executor),
        implementation(LogicRole::ZkmeSBTHub, "ZkmeSBTHub"),
        implementation(LogicRole::AdditionalBucketHub, "AdditionalBucketHub"),
        implementation(LogicRole::AdditionalObjectHub, "AdditionalObjectHub"),
        implementation(LogicRole::AdditionalGroupHub, "AdditionalGroupHub"),
        implementation(LogicRole::AdditionalPermissionHub, "AdditionalPermissionHub"),
        erc721(
            LogicRole::BucketToken,
            "Mechain-Bucket",
            "BUCKET",
            "bucket",
            ProxyRole::BucketHub,
        ),
        erc721(
            LogicRole::ObjectToken,
            "Mechain-Object",
            "OBJECT",
            "object",
            ProxyRole::ObjectHub,
        ),
        erc721(
            LogicRole::GroupToken,
            "Mechain-Group",
            "GROUP",
            "group",
            ProxyRole::GroupHub,
        ),
        erc721(
            LogicRole::PermissionToken,
            "Mechain-PermissionToken",
            "PERMISSION",
            "permission",
            ProxyRole::PermissionHub,
        ),
        (
            LogicRole::MemberToken,
            ContractSpec::new(
                ERC1155_TOKEN,
                vec![
                    Literal(Value::String("member".to_owned())),
                    Proxy(ProxyRole::GroupHub),
                ],
            ),
        ),
    ];

    DeploymentPlan {
        umbrella: ContractSpec::new(
            UMBRELLA_DEPLOYER,
            vec![
                Literal(Value::Uint(U256::from(config.remote_chain_id))),
                Literal(Value::Bool(config.cross_chain_transfer_enabled)),
            ],
        ),
        proxies: ProxyRole::ALL.to_vec(),
        logic,
        activation_order: ACTIVATION_ORDER.to_vec(),
        executor_contract: executor,
    }
}

impl DeploymentPlan {
    /// Checks that every back-reference points at something resolved
    /// earlier and that the activation slots match [`ACTIVATION_ORDER`].
    pub fn validate(&self) -> Result<(), PlanError> {
        let proxies: HashSet<ProxyRole> = self.proxies.iter().copied().collect();
        let mut deployed: HashSet<LogicRole> = HashSet::new();

        for arg in &self.umbrella.constructor_args {
            if let Some(reference) = describe_reference(arg) {
                return Err(PlanError::ForwardReference {
                    contract: self.umbrella.identifier.clone(),
                    reference,
                });
            }
        }

        for (role, spec) in &self.logic {
            for arg in &spec.constructor_args {
                let resolved = match arg {
                    ConstructorArg::Literal(_) => true,
                    ConstructorArg::Proxy(proxy) => proxies.contains(proxy),
                    ConstructorArg::Logic(logic) => deployed.contains(logic),
                };
                if !resolved {
                    return Err(PlanError::ForwardReference {
                        contract: spec.identifier.clone(),
                        reference: describe_reference(arg).unwrap_or_default(),
                    });
                }
            }
            if !deployed.insert(*role) {
                return Err(PlanError::DuplicateRole(*role));
            }
        }

        if self.activation_order.len() != ACTIVATION_ORDER.len() {
            return Err(PlanError::ActivationLength {
                expected: ACTIVATION_ORDER.len(),
                actual: self.activation_order.len(),
            });
        }
        for (position, (expected, actual)) in ACTIVATION_ORDER
            .iter()
            .zip(&self.activation_order)
            .enumerate()
        {
            if expected != actual {
                return Err(PlanError::ActivationOrder {
                    position,
                    expected: *expected,
                    actual: *actual,
                });
            }
            if !deployed.contains(expected) {
                return Err(PlanError::UnresolvedLogic(*expected));
            }
        }
        Ok(())
    }

    pub fn resolve_args(
        &self,
        spec: &ContractSpec,
        resolved: &ResolvedAddresses,
    ) -> Result<Vec<Value>, PlanError> {
        spec.constructor_args
            .iter()
            .map(|arg| match arg {
                ConstructorArg::Literal(value) => Ok(value.clone()),
                ConstructorArg::Proxy(role) => resolved.proxy(*role).map(Value::Address),
                ConstructorArg::Logic(role) => resolved.logic(*role).map(Value::Address),
            })
            .collect()
    }

    /// Addresses for `deploy(address[],bytes)`, slot by slot.
    pub fn activation_addresses(
        &self,
        resolved: &ResolvedAddresses,
    ) -> Result<Vec<Address>, PlanError> {
        self.activation_order
            .iter()
            .map(|role| resolved.logic(*role))
            .collect()
    }

    /// `Config.sol` constant name for every proxy, in plan order.
    pub fn config_constants(
        &self,
        resolved: &ResolvedAddresses,
    ) -> Result<IndexMap<String, Address>, PlanError> {
        self.proxies
            .iter()
            .map(|role| {
                Ok((
                    role.config_constant(&self.executor_contract),
                    resolved.proxy(*role)?,
                ))
            })
            .collect()
    }
}

fn describe_reference(arg: &ConstructorArg) -> Option<String> {
    match arg {
        ConstructorArg::Literal(_) => None,
        ConstructorArg::Proxy(role) => Some(format!("proxy {role:?}")),
        ConstructorArg::Logic(role) => Some(format!("contract {role:?}")),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use bridge_common::networks::{GREENFIELD_EXECUTOR, MECHAIN_EXECUTOR};

    fn config(executor: &str) -> BridgeConfig {
        BridgeConfig {
            remote_chain_id: 5151,
            cross_chain_transfer_enabled: true,
            executor_contract: executor.to_owned(),
        }
    }

    #[test]
    fn planning_is_deterministic() {
        let first = plan(&config(GREENFIELD_EXECUTOR));
        let second = plan(&config(GREENFIELD_EXECUTOR));
        assert_eq!(first, second);
        assert_eq!(first.activation_order.len(), 21);
        assert_eq!(first.activation_order, second.activation_order);
        first.validate().unwrap();
    }

    #[test]
    fn activation_slots_follow_the_umbrella_contract() {
        let plan = plan(&config(GREENFIELD_EXECUTOR));
        assert_eq!(plan.activation_order[3], LogicRole::LightClient);
        assert_eq!(plan.activation_order[11], LogicRole::BucketToken);
        assert_eq!(plan.activation_order[14], LogicRole::MemberToken);
        assert_eq!(plan.activation_order[15], LogicRole::PermissionHub);
        assert_eq!(plan.activation_order[20], LogicRole::ZkmeSBTHub);
    }

    #[test]
    fn executor_varies_per_network() {
        let plan = plan(&config(MECHAIN_EXECUTOR));
        let (_, executor) = plan
            .logic
            .iter()
            .find(|(role, _)| *role == LogicRole::Executor)
            .unwrap();
        assert_eq!(executor.identifier, MECHAIN_EXECUTOR);
        assert_eq!(ProxyRole::Executor.getter(MECHAIN_EXECUTOR), "proxyMechainExecutor()");
        assert_eq!(
            ProxyRole::Executor.config_constant(MECHAIN_EXECUTOR),
            "MECHAIN_EXECUTOR"
        );
    }

    #[test]
    fn getters_and_constants_match_contract_names() {
        assert_eq!(ProxyRole::ProxyAdmin.getter(GREENFIELD_EXECUTOR), "proxyAdmin()");
        assert_eq!(ProxyRole::GovHub.getter(GREENFIELD_EXECUTOR), "proxyGovHub()");
        assert_eq!(ProxyRole::ZkmeSBTHub.getter(GREENFIELD_EXECUTOR), "proxyZkmeSBTHub()");

        let constants: Vec<String> = ProxyRole::ALL
            .iter()
            .map(|role| role.config_constant(GREENFIELD_EXECUTOR))
            .collect();
        assert_eq!(
            constants,
            [
                "PROXY_ADMIN",
                "GOV_HUB",
                "CROSS_CHAIN",
                "TOKEN_HUB",
                "LIGHT_CLIENT",
                "RELAYER_HUB",
                "BUCKET_HUB",
                "OBJECT_HUB",
                "GROUP_HUB",
                "PERMISSION_HUB",
                "MULTI_MESSAGE",
                "GREENFIELD_EXECUTOR",
                "ZKME_SBT_HUB",
            ]
        );
    }

    #[test]
    fn tokens_reference_their_hub_proxies() {
        let plan = plan(&config(GREENFIELD_EXECUTOR));
        let (_, member) = plan
            .logic
            .iter()
            .find(|(role, _)| *role == LogicRole::MemberToken)
            .unwrap();
        assert_eq!(member.identifier, ERC1155_TOKEN);
        assert_eq!(
            member.constructor_args[1],
            ConstructorArg::Proxy(ProxyRole::GroupHub)
        );
    }

    #[test]
    fn forward_references_are_rejected() {
        let mut plan = plan(&config(GREENFIELD_EXECUTOR));
        // First logic contract pointing at the last one.
        plan.logic[0]
            .1
            .constructor_args
            .push(ConstructorArg::Logic(LogicRole::MemberToken));
        assert!(matches!(
            plan.validate(),
            Err(PlanError::ForwardReference { contract, .. }) if contract == "GovHub"
        ));
    }

    #[test]
    fn reordered_activation_is_rejected() {
        let mut plan = plan(&config(GREENFIELD_EXECUTOR));
        plan.activation_order.swap(0, 1);
        assert_eq!(
            plan.validate(),
            Err(PlanError::ActivationOrder {
                position: 0,
                expected: LogicRole::GovHub,
                actual: LogicRole::CrossChain,
            })
        );

        let mut plan = super::plan(&config(GREENFIELD_EXECUTOR));
        plan.activation_order.pop();
        assert_eq!(
            plan.validate(),
            Err(PlanError::ActivationLength {
                expected: 21,
                actual: 20
            })
        );
    }

    #[test]
    fn unresolved_addresses_surface_as_errors() {
        let plan = plan(&config(GREENFIELD_EXECUTOR));
        let resolved = ResolvedAddresses::default();
        assert_eq!(
            plan.activation_addresses(&resolved),
            Err(PlanError::UnresolvedLogic(LogicRole::GovHub))
        );
        let (_, bucket_token) = &plan.logic[16];
        assert_eq!(
            plan.resolve_args(bucket_token, &resolved),
            Err(PlanError::UnresolvedProxy(ProxyRole::BucketHub))
        );
    }
}

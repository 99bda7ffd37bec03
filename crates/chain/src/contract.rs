//! Minimal ABI surface for the anchor contract (spec §6): two write entry
//! points (legacy vs emit-only deployments carry different gas profiles)
//! and the one event both emit.

alloy::sol! {
    #[sol(rpc)]
    interface AnchorStore {
        function putRootLegacy(uint256 timeWindow, bytes32 root) external;
        function putRootEmitOnly(uint256 timeWindow, bytes32 root) external;

        event MerkleRootSubmitted(
            uint256 indexed timeWindow,
            bytes32 indexed root,
            address indexed issuer,
            uint256 blockNumber
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractType {
    Legacy,
    EmitOnly,
}

impl std::str::FromStr for ContractType {
    type Err = justifai_errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(ContractType::Legacy),
            "emit_only" | "emitOnly" => Ok(ContractType::EmitOnly),
            other => Err(justifai_errors::Error::configuration(format!(
                "unknown CONTRACT_TYPE {other:?}, expected legacy|emit_only"
            ))),
        }
    }
}

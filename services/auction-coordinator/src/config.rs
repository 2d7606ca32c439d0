use commons::{
    constants::*, AllowListRegistry, AuctionResult, CustomError, EcdsaValidator, EthAddress,
};
use concordium_std::*;

/// Settlement contract address.
pub const MARKET_CON_ADDR_VAR: &str = "MARKET_CON_ADDR";
/// Comma separated NFT collections that may be listed.
pub const NFT_CONTRACTS_VAR: &str = "NFT_CONTRACTS";
/// Comma separated payment tokens that may be bid with.
pub const ERC20_CONTRACTS_VAR: &str = "ERC20_CONTRACTS";

#[derive(Debug, Clone, PartialEq, Eq, SchemaType, Serialize)]
pub struct InitParams {
    /// Contract whose `TransactionExecuted` events are trusted.
    pub settlement_contract: EthAddress,
    /// ERC-721 contracts known to the validator.
    pub nft_contracts: Vec<EthAddress>,
    /// ERC-20 contracts known to the validator.
    pub erc20_contracts: Vec<EthAddress>,
}

impl InitParams {
    pub fn from_env() -> AuctionResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the parameters through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AuctionResult<Self> {
        let settlement_contract = lookup(MARKET_CON_ADDR_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                CustomError::invalid_argument(
                    SETTLEMENT_CONTRACT,
                    format!("{} is not set", MARKET_CON_ADDR_VAR),
                )
            })?;

        Ok(Self {
            settlement_contract,
            nft_contracts: split_list(lookup(NFT_CONTRACTS_VAR)),
            erc20_contracts: split_list(lookup(ERC20_CONTRACTS_VAR)),
        })
    }

    /// Parses parameters serialized the way contract init parameters are.
    pub fn from_bytes(bytes: &[u8]) -> AuctionResult<Self> {
        Ok(from_bytes(bytes)?)
    }

    pub fn registry(&self) -> AuctionResult<AllowListRegistry> {
        AllowListRegistry::from_hex(&self.nft_contracts, &self.erc20_contracts)
    }

    /// The validator for these parameters. The settlement contract address
    /// must be valid too.
    pub fn validator(&self) -> AuctionResult<EcdsaValidator<AllowListRegistry>> {
        ensure!(
            commons::parse_address(&self.settlement_contract).is_some(),
            CustomError::invalid_argument(
                SETTLEMENT_CONTRACT,
                format!("{} is not a valid address", self.settlement_contract)
            )
        );
        Ok(EcdsaValidator::new(self.registry()?))
    }
}

fn split_list(value: Option<String>) -> Vec<EthAddress> {
    value
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::ErrorKind;
    use std::collections::BTreeMap;

    const MARKET: &str = "0x9a676e781a523b5d0c0e43731313a708cb607508";
    const NFT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const ERC20: &str = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512";

    fn lookup_in(vars: BTreeMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
        move |key: &str| vars.get(key).cloned()
    }

    #[concordium_test]
    fn test_from_lookup() {
        let mut vars = BTreeMap::new();
        vars.insert(MARKET_CON_ADDR_VAR, MARKET.to_string());
        vars.insert(NFT_CONTRACTS_VAR, format!("{}, ,{}", NFT, ERC20));

        let params = InitParams::from_lookup(lookup_in(vars)).expect_report("valid params");

        claim_eq!(params.settlement_contract, MARKET);
        claim_eq!(params.nft_contracts, vec![NFT.to_string(), ERC20.to_string()]);
        claim!(params.erc20_contracts.is_empty());
    }

    #[concordium_test]
    fn test_missing_settlement_contract() {
        let mut vars = BTreeMap::new();
        vars.insert(MARKET_CON_ADDR_VAR, "  ".to_string());

        let err = InitParams::from_lookup(lookup_in(vars)).expect_err_report("blank address");
        claim_eq!(err.field(), Some(SETTLEMENT_CONTRACT));
    }

    #[concordium_test]
    fn test_from_bytes() {
        let params = InitParams {
            settlement_contract: MARKET.to_string(),
            nft_contracts: vec![NFT.to_string()],
            erc20_contracts: vec![ERC20.to_string()],
        };

        let parsed = InitParams::from_bytes(&to_bytes(&params)).expect_report("parse");
        claim_eq!(parsed, params);

        let err = InitParams::from_bytes(&[1, 2, 3]).expect_err_report("garbage");
        claim_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[concordium_test]
    fn test_validator() {
        let params = InitParams {
            settlement_contract: MARKET.to_string(),
            nft_contracts: vec![NFT.to_string()],
            erc20_contracts: vec!["0xnope".to_string()],
        };
        let err = params.validator().expect_err_report("bad erc20 entry");
        claim_eq!(err.field(), Some(ERC20_CONTRACTS));

        let params = InitParams {
            settlement_contract: "market".to_string(),
            nft_contracts: vec![],
            erc20_contracts: vec![],
        };
        let err = params.validator().expect_err_report("bad settlement contract");
        claim_eq!(err.field(), Some(SETTLEMENT_CONTRACT));
    }
}

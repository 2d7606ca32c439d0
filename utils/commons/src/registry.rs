use crate::{constants::*, parse_address, AuctionResult, CustomError};
use alloy_primitives::Address;
use concordium_std::concordium_cfg_test;
use std::collections::BTreeSet;

/// Knowledge about which contracts implement the token standards the
/// marketplace trades.
pub trait ContractRegistry {
    fn supports_erc721(&self, contract: &Address) -> bool;

    fn supports_erc20(&self, contract: &Address) -> bool;
}

/// Registry backed by configured allow-lists of collections and payment
/// tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowListRegistry {
    nft_contracts: BTreeSet<Address>,
    erc20_contracts: BTreeSet<Address>,
}

impl AllowListRegistry {
    pub fn new(
        nft_contracts: impl IntoIterator<Item = Address>,
        erc20_contracts: impl IntoIterator<Item = Address>,
    ) -> Self {
        Self {
            nft_contracts: nft_contracts.into_iter().collect(),
            erc20_contracts: erc20_contracts.into_iter().collect(),
        }
    }

    /// Builds the registry from hex addresses, failing on the first one that
    /// does not parse.
    pub fn from_hex<A: AsRef<str>>(nft_contracts: &[A], erc20_contracts: &[A]) -> AuctionResult<Self> {
        Ok(Self::new(
            parse_all(nft_contracts, NFT_CONTRACTS)?,
            parse_all(erc20_contracts, ERC20_CONTRACTS)?,
        ))
    }
}

impl ContractRegistry for AllowListRegistry {
    fn supports_erc721(&self, contract: &Address) -> bool {
        self.nft_contracts.contains(contract)
    }

    fn supports_erc20(&self, contract: &Address) -> bool {
        self.erc20_contracts.contains(contract)
    }
}

fn parse_all<A: AsRef<str>>(addresses: &[A], field: &'static str) -> AuctionResult<Vec<Address>> {
    addresses
        .iter()
        .map(|addr| {
            parse_address(addr.as_ref()).ok_or_else(|| {
                CustomError::invalid_argument(
                    field,
                    format!("{} is not a valid address", addr.as_ref()),
                )
            })
        })
        .collect()
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::{claim, claim_eq, concordium_test, fail, ExpectReport};

    const NFT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const ERC20: &str = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512";

    #[concordium_test]
    fn test_from_hex() {
        let registry = AllowListRegistry::from_hex(&[NFT], &[ERC20]).expect_report("valid lists");
        let nft = parse_address(NFT).expect_report("valid nft");
        let erc20 = parse_address(ERC20).expect_report("valid erc20");

        claim!(registry.supports_erc721(&nft));
        claim!(!registry.supports_erc20(&nft));
        claim!(registry.supports_erc20(&erc20));
        claim!(!registry.supports_erc721(&erc20));
    }

    #[concordium_test]
    fn test_from_hex_rejects_garbage() {
        let result = AllowListRegistry::from_hex(&[NFT, "0xnope"], &[]);
        match result {
            Err(err) => claim_eq!(err.field(), Some(NFT_CONTRACTS)),
            Ok(_) => fail!("garbage address must be rejected"),
        }
    }
}

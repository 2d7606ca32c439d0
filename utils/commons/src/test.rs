use crate::{HasValidator, MessagePart, Uint256};
use std::collections::BTreeSet;

/// Validator with programmable verdicts. Everything is accepted unless it was
/// explicitly rejected.
#[derive(Debug, Clone, Default)]
pub struct MockValidator {
    rejected_addrs: BTreeSet<String>,
    rejected_nft_contracts: BTreeSet<String>,
    rejected_erc20_contracts: BTreeSet<String>,
    rejected_signatures: BTreeSet<String>,
}

impl MockValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_addr(mut self, addr: &str) -> Self {
        self.rejected_addrs.insert(addr.to_string());
        self
    }

    pub fn reject_nft_contract(mut self, addr: &str) -> Self {
        self.rejected_nft_contracts.insert(addr.to_string());
        self
    }

    pub fn reject_erc20_contract(mut self, addr: &str) -> Self {
        self.rejected_erc20_contracts.insert(addr.to_string());
        self
    }

    pub fn reject_signature(mut self, signature: &str) -> Self {
        self.rejected_signatures.insert(signature.to_string());
        self
    }
}

impl HasValidator for MockValidator {
    fn is_valid_addr(&self, addr: &str) -> bool {
        !self.rejected_addrs.contains(addr)
    }

    fn is_valid_nft_contract(&self, addr: &str) -> bool {
        !self.rejected_nft_contracts.contains(addr)
    }

    fn is_valid_erc20_contract(&self, addr: &str) -> bool {
        !self.rejected_erc20_contracts.contains(addr)
    }

    fn is_signature_valid(&self, signature: &str, _signer: &str, _parts: &[MessagePart]) -> bool {
        !self.rejected_signatures.contains(signature)
    }
}

/// Shorthand for small `uint256` values.
pub fn uint(value: u64) -> Uint256 {
    Uint256::from(value)
}

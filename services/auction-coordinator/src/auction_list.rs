use commons::{
    canonical_address, constants::*, same_address, AuctionResult, CustomError, EthAddress,
    HasValidator, ListId, TokenId,
};
use concordium_std::*;
use std::{collections::BTreeSet, sync::Arc};

use crate::token::Token;

/// One owner's auction session for one NFT collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct AuctionList {
    /// Assigned by storage.
    list_id: ListId,
    owner_addr: EthAddress,
    nft_contract_addr: EthAddress,
    /// Tokens in order of addition, unique by id.
    tokens: Vec<Token>,
}

impl AuctionList {
    pub fn list_id(&self) -> ListId {
        self.list_id
    }

    pub fn owner_addr(&self) -> &EthAddress {
        &self.owner_addr
    }

    pub fn nft_contract_addr(&self) -> &EthAddress {
        &self.nft_contract_addr
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether this is the session of `owner_addr` for `nft_contract_addr`,
    /// whatever the letter case of either address.
    pub fn is_for(&self, owner_addr: &str, nft_contract_addr: &str) -> bool {
        same_address(&self.owner_addr, owner_addr)
            && same_address(&self.nft_contract_addr, nft_contract_addr)
    }

    pub fn add_token(&mut self, token: Token) -> AuctionResult<()> {
        ensure!(
            self.position(token.id()).is_none(),
            CustomError::conflict(format!("token {} already in list", token.id()))
        );
        self.tokens.push(token);
        Ok(())
    }

    pub fn delete_token(&mut self, token_id: TokenId) -> AuctionResult<Token> {
        let idx = self.position(token_id).ok_or_else(|| no_token(token_id))?;
        Ok(self.tokens.remove(idx))
    }

    pub fn get_token(&self, token_id: TokenId) -> AuctionResult<&Token> {
        self.tokens
            .iter()
            .find(|token| token.id() == token_id)
            .ok_or_else(|| no_token(token_id))
    }

    pub fn get_token_mut(&mut self, token_id: TokenId) -> AuctionResult<&mut Token> {
        self.tokens
            .iter_mut()
            .find(|token| token.id() == token_id)
            .ok_or_else(|| no_token(token_id))
    }

    /// Checks the structure a stored list must keep: unique token ids, and
    /// bids that belong to this list's owner, collection and token, at most
    /// one per bidder.
    pub fn check_well_formed(&self) -> AuctionResult<()> {
        let mut token_ids = BTreeSet::new();
        for token in &self.tokens {
            ensure!(
                token_ids.insert(token.id()),
                malformed(format!("tokenId {} appears twice", token.id()))
            );

            let mut bidders = BTreeSet::new();
            for bid in token.bids() {
                ensure!(
                    bid.token_id() == token.id()
                        && self.is_for(bid.owner_addr(), bid.nft_contract_addr()),
                    malformed(format!(
                        "bid of {} does not belong to tokenId {}",
                        bid.bidder_addr(),
                        token.id()
                    ))
                );
                ensure!(
                    bidders.insert(canonical_address(bid.bidder_addr())),
                    malformed(format!(
                        "{} has more than one bid on tokenId {}",
                        bid.bidder_addr(),
                        token.id()
                    ))
                );
            }
        }
        Ok(())
    }

    fn position(&self, token_id: TokenId) -> Option<usize> {
        self.tokens.iter().position(|token| token.id() == token_id)
    }
}

fn no_token(token_id: TokenId) -> CustomError {
    CustomError::not_found(format!("no token found with tokenId {}", token_id))
}

fn malformed(message: String) -> CustomError {
    CustomError::invalid_argument(LIST, message)
}

pub struct AuctionListFactory<V> {
    validator: Arc<V>,
}

impl<V: HasValidator> AuctionListFactory<V> {
    pub fn new(validator: Arc<V>) -> Self {
        Self { validator }
    }

    pub fn create_list(
        &self,
        list_id: ListId,
        owner_addr: &str,
        nft_contract_addr: &str,
        tokens: Vec<Token>,
    ) -> AuctionResult<AuctionList> {
        ensure!(
            self.validator.is_valid_addr(owner_addr),
            CustomError::invalid_argument(
                OWNER_ADDR,
                format!("{} is not a valid address", owner_addr)
            )
        );

        ensure!(
            self.validator.is_valid_nft_contract(nft_contract_addr),
            CustomError::invalid_argument(
                NFT_CONTRACT_ADDR,
                format!("{} is not a valid nft contract address", nft_contract_addr)
            )
        );

        let mut list = AuctionList {
            list_id,
            owner_addr: canonical_address(owner_addr),
            nft_contract_addr: canonical_address(nft_contract_addr),
            tokens: Vec::with_capacity(tokens.len()),
        };
        for token in tokens {
            list.add_token(token)?;
        }
        Ok(list)
    }
}

#[concordium_cfg_test]
pub(crate) mod tests {
    use super::*;
    use crate::{bid::tests::make_bid, token::tests::make_token};
    use commons::{
        test::{uint, MockValidator},
        ErrorKind,
    };

    pub(crate) fn make_list(list_id: ListId, tokens: Vec<Token>) -> AuctionList {
        AuctionListFactory::new(Arc::new(MockValidator::new()))
            .create_list(list_id, "0xA", "0xB", tokens)
            .expect_report("valid list")
    }

    #[concordium_test]
    fn test_create_list() {
        let list = make_list(0, vec![make_token(1, 10), make_token(2, 5)]);

        claim_eq!(list.list_id(), 0);
        claim_eq!(list.owner_addr(), "0xa");
        claim_eq!(list.nft_contract_addr(), "0xb");
        claim_eq!(list.tokens().len(), 2);
        claim!(list.is_for("0xA", "0xB"));
        claim!(list.is_for("0xa", "0Xb"));
        claim!(!list.is_for("0xA", "0xE"));
    }

    #[concordium_test]
    fn test_create_list_validation() {
        let factory = AuctionListFactory::new(Arc::new(
            MockValidator::new().reject_addr("0xZ").reject_nft_contract("0xY"),
        ));

        let err = factory
            .create_list(0, "0xZ", "0xB", vec![])
            .expect_err_report("bad owner");
        claim_eq!(err.field(), Some(OWNER_ADDR));

        let err = factory
            .create_list(0, "0xA", "0xY", vec![])
            .expect_err_report("bad collection");
        claim_eq!(err.field(), Some(NFT_CONTRACT_ADDR));

        let err = factory
            .create_list(0, "0xA", "0xB", vec![make_token(1, 10), make_token(1, 20)])
            .expect_err_report("duplicate token");
        claim_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[concordium_test]
    fn test_token_operations() {
        let mut list = make_list(0, vec![make_token(1, 10)]);

        let err = list.add_token(make_token(1, 99)).expect_err_report("duplicate token");
        claim_eq!(err.kind(), ErrorKind::Conflict);

        list.add_token(make_token(2, 5)).expect_report("new token");
        claim_eq!(list.get_token(uint(2)).expect_report("token").min_price(), uint(5));

        let err = list.get_token(uint(3)).expect_err_report("unknown token");
        claim_eq!(err.kind(), ErrorKind::NotFound);

        list.delete_token(uint(1)).expect_report("delete token");
        let err = list.delete_token(uint(1)).expect_err_report("already deleted");
        claim_eq!(err.kind(), ErrorKind::NotFound);
        claim_eq!(list.tokens().len(), 1);
    }

    #[concordium_test]
    fn test_check_well_formed() {
        let mut list = make_list(0, vec![make_token(1, 10)]);
        list.get_token_mut(uint(1))
            .expect_report("token")
            .add_bid(make_bid("0xC", 1, 20))
            .expect_report("bid");
        claim!(list.check_well_formed().is_ok());

        // Bid placed on another token id
        let mut stray = list.clone();
        stray
            .get_token_mut(uint(1))
            .expect_report("token")
            .add_bid(make_bid("0xE", 2, 20))
            .expect_report("bid");
        let err = stray.check_well_formed().expect_err_report("stray bid");
        claim_eq!(err.field(), Some(LIST));

        // Duplicate token ids can only come from direct construction
        let mut duplicated = list.clone();
        duplicated.tokens.push(make_token(1, 10));
        let err = duplicated.check_well_formed().expect_err_report("duplicate ids");
        claim_eq!(err.field(), Some(LIST));
    }

    #[concordium_test]
    fn test_copy_is_independent() {
        let list = make_list(0, vec![make_token(1, 10)]);
        let mut copy = list.clone();
        copy.get_token_mut(uint(1))
            .expect_report("token")
            .add_bid(make_bid("0xC", 1, 20))
            .expect_report("bid");

        claim!(list.get_token(uint(1)).expect_report("token").bids().is_empty());
    }
}

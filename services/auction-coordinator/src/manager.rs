use commons::{
    constants::TOKENS, AuctionResult, CustomError, EthSignature, HasEventLog, HasValidator,
    ListId, MemEventLog, TokenId,
};
use concordium_std::*;
use std::sync::{Arc, Mutex};

use crate::{
    auction_list::AuctionList,
    bid::{Bid, BidFactory},
    events::AuctionEvents,
    external::{MakeBidParams, TokenParams},
    storage::AuctionStorage,
    token::{Token, TokenFactory},
};

/// Manager shared between request handling and settlement cleanup. Holding
/// the lock is the single-writer discipline over the storage.
pub type SharedAuctionManager<V, S, L = MemEventLog> = Arc<Mutex<AuctionManager<V, S, L>>>;

/// Entry point for every auction operation. It checks the business rules,
/// mutates copies of the stored entities and writes them back through the
/// storage. Every successful mutation is logged.
pub struct AuctionManager<V, S, L = MemEventLog> {
    validator: Arc<V>,
    storage: S,
    token_factory: TokenFactory,
    bid_factory: BidFactory<V>,
    logger: L,
}

impl<V: HasValidator, S: AuctionStorage> AuctionManager<V, S> {
    pub fn new(validator: Arc<V>, storage: S) -> Self {
        Self::with_logger(validator, storage, MemEventLog::new())
    }
}

impl<V: HasValidator, S: AuctionStorage, L: HasEventLog> AuctionManager<V, S, L> {
    pub fn with_logger(validator: Arc<V>, storage: S, logger: L) -> Self {
        Self {
            bid_factory: BidFactory::new(Arc::clone(&validator)),
            token_factory: TokenFactory,
            validator,
            storage,
            logger,
        }
    }

    pub fn into_shared(self) -> SharedAuctionManager<V, S, L> {
        Arc::new(Mutex::new(self))
    }

    pub fn validator(&self) -> &Arc<V> {
        &self.validator
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    /// Opens a list for `owner_addr` on `nft_contract_addr` with at least one
    /// token.
    pub fn create_list(
        &mut self,
        owner_addr: &str,
        nft_contract_addr: &str,
        tokens: &[TokenParams],
    ) -> AuctionResult<AuctionList> {
        ensure!(
            !tokens.is_empty(),
            CustomError::invalid_argument(TOKENS, "tokens must be a non empty array")
        );

        let tokens = tokens
            .iter()
            .map(|params| self.token_factory.create_token(params))
            .collect::<AuctionResult<Vec<Token>>>()?;

        let list = self.storage.create_list(owner_addr, nft_contract_addr, tokens)?;
        self.logger.log(&AuctionEvents::create_list(&list));
        Ok(list)
    }

    pub fn delete_list(&mut self, list_id: ListId) -> AuctionResult<()> {
        let list = self.storage.delete_list(list_id)?;
        self.logger.log(&AuctionEvents::delete_list(&list));
        Ok(())
    }

    pub fn get_list(&self, list_id: ListId) -> AuctionResult<AuctionList> {
        self.storage.get_list(list_id)
    }

    pub fn get_lists(&self) -> Vec<AuctionList> {
        self.storage.get_lists()
    }

    /// The list `owner_addr` holds for `nft_contract_addr`.
    pub fn find_list(&self, owner_addr: &str, nft_contract_addr: &str) -> AuctionResult<AuctionList> {
        self.storage
            .find_list(owner_addr, nft_contract_addr)
            .ok_or_else(|| {
                CustomError::not_found(format!(
                    "no auction list with nftContractAddr {} and ownerAddr {}",
                    nft_contract_addr, owner_addr
                ))
            })
    }

    pub fn add_token(&mut self, list_id: ListId, params: &TokenParams) -> AuctionResult<Token> {
        let token = self.token_factory.create_token(params)?;
        let mut list = self.storage.get_list(list_id)?;

        list.add_token(token.clone())?;
        self.storage.update_list(list)?;

        self.logger.log(&AuctionEvents::add_token(list_id, &token));
        Ok(token)
    }

    pub fn delete_token(&mut self, list_id: ListId, token_id: TokenId) -> AuctionResult<()> {
        let mut list = self.storage.get_list(list_id)?;

        let token = list.delete_token(token_id)?;
        self.storage.update_list(list)?;

        self.logger.log(&AuctionEvents::delete_token(list_id, &token));
        Ok(())
    }

    pub fn get_token(&self, list_id: ListId, token_id: TokenId) -> AuctionResult<Token> {
        self.storage.get_list(list_id)?.get_token(token_id).cloned()
    }

    /// Places or revises a bid on a token of the list matching the bid's
    /// owner and collection. The bidder's signature is checked while building
    /// the bid.
    pub fn make_bid(&mut self, params: MakeBidParams) -> AuctionResult<Bid> {
        let mut list = self.find_list(&params.owner_addr, &params.nft_contract_addr)?;
        let list_id = list.list_id();
        let token = list.get_token_mut(params.token_id)?;

        let bid = self.bid_factory.create_bid(params)?;
        token.add_bid(bid.clone())?;
        self.storage.update_list(list)?;

        self.logger.log(&AuctionEvents::make_bid(list_id, &bid));
        Ok(bid)
    }

    pub fn delete_bid(
        &mut self,
        list_id: ListId,
        token_id: TokenId,
        bidder_addr: &str,
    ) -> AuctionResult<()> {
        let mut list = self.storage.get_list(list_id)?;

        let bid = list.get_token_mut(token_id)?.delete_bid(bidder_addr)?;
        self.storage.update_list(list)?;

        self.logger.log(&AuctionEvents::delete_bid(list_id, &bid));
        Ok(())
    }

    pub fn get_bid(
        &self,
        list_id: ListId,
        token_id: TokenId,
        bidder_addr: &str,
    ) -> AuctionResult<Bid> {
        self.storage
            .get_list(list_id)?
            .get_token(token_id)?
            .get_bid(bidder_addr)
            .cloned()
    }

    /// Approves a bid once the list owner's signature over the bid terms has
    /// been verified. Only the owner signature of the bid changes.
    pub fn approve_bid(
        &mut self,
        list_id: ListId,
        token_id: TokenId,
        bidder_addr: &str,
        owner_signature: EthSignature,
    ) -> AuctionResult<Bid> {
        let mut list = self.storage.get_list(list_id)?;
        let owner_addr = list.owner_addr().clone();
        let bid = list.get_token_mut(token_id)?.get_bid_mut(bidder_addr)?;

        ensure!(
            self.validator
                .is_signature_valid(&owner_signature, &owner_addr, &bid.terms()),
            CustomError::invalid_signature("ownerSignature not valid")
        );
        bid.set_owner_signature(owner_signature)?;

        let approved = bid.clone();
        self.storage.update_list(list)?;

        if let Some(event) = AuctionEvents::approve_bid(list_id, &approved) {
            self.logger.log(&event);
        }
        Ok(approved)
    }

    /// Drops a token whose sale was executed on-chain. There is no signature
    /// check; only the settlement listener calls this. A list left without
    /// tokens is removed.
    ///
    /// Returns whether anything was removed. Missing lists or tokens are not
    /// an error.
    pub fn local_delete_token(
        &mut self,
        owner_addr: &str,
        nft_contract_addr: &str,
        token_id: TokenId,
    ) -> AuctionResult<bool> {
        let mut list = match self.storage.find_list(owner_addr, nft_contract_addr) {
            Some(list) => list,
            None => return Ok(false),
        };
        if list.delete_token(token_id).is_err() {
            return Ok(false);
        }

        let list_removed = list.is_empty();
        if list_removed {
            self.storage.delete_list(list.list_id())?;
        } else {
            self.storage.update_list(list.clone())?;
        }

        self.logger.log(&AuctionEvents::settle(
            list.owner_addr(),
            list.nft_contract_addr(),
            token_id,
            list_removed,
        ));
        Ok(true)
    }
}

#[concordium_cfg_test]
pub(crate) mod tests {
    use super::*;
    use crate::{bid::tests::bid_params, storage::MemAuctionStorage, token::tests::token_params};
    use commons::{
        constants::*,
        test::{uint, MockValidator},
        ErrorKind,
    };

    pub(crate) type TestManager = AuctionManager<MockValidator, MemAuctionStorage<MockValidator>>;

    pub(crate) fn manager_with(validator: MockValidator) -> TestManager {
        let validator = Arc::new(validator);
        AuctionManager::new(Arc::clone(&validator), MemAuctionStorage::new(validator))
    }

    fn manager() -> TestManager {
        manager_with(MockValidator::new())
    }

    fn listed_manager() -> TestManager {
        let mut manager = manager();
        manager
            .create_list("0xA", "0xB", &[token_params(1, 10)])
            .expect_report("list");
        manager
    }

    #[concordium_test]
    fn test_auction_lifecycle() {
        let mut manager = manager();

        let list = manager
            .create_list("0xA", "0xB", &[token_params(1, 10)])
            .expect_report("create list");
        claim_eq!(list.list_id(), 0);

        manager
            .make_bid(bid_params("0xC", 1, 20))
            .expect_report("bid above min price");
        claim_eq!(
            manager.get_token(0, uint(1)).expect_report("token").bids().len(),
            1
        );

        let err = manager
            .make_bid(bid_params("0xC", 1, 5))
            .expect_err_report("bid below min price");
        claim_eq!(err.field(), Some(ERC20_AMOUNT));
        claim_eq!(err.message(), "erc20amount is less than min price");

        manager
            .approve_bid(0, uint(1), "0xC", "owner-sig".to_string())
            .expect_report("approve");
        let bid = manager.get_bid(0, uint(1), "0xC").expect_report("bid");
        claim_eq!(bid.owner_signature().map(String::as_str), Some("owner-sig"));
        claim_eq!(bid.erc20amount(), uint(20));

        manager.delete_list(0).expect_report("delete list");
        claim!(manager.get_lists().is_empty());
    }

    #[concordium_test]
    fn test_create_list_twice_conflicts() {
        let mut manager = listed_manager();

        let err = manager
            .create_list("0xA", "0xB", &[token_params(1, 10)])
            .expect_err_report("duplicate list");
        claim_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[concordium_test]
    fn test_create_list_round_trip() {
        let mut manager = manager();
        let tokens = [token_params(1, 10), token_params(4, 0)];
        manager.create_list("0xA", "0xB", &tokens).expect_report("list");

        let list = manager.get_list(0).expect_report("stored list");
        claim_eq!(list.owner_addr(), "0xa");
        claim_eq!(list.nft_contract_addr(), "0xb");
        let stored: Vec<TokenParams> = list
            .tokens()
            .iter()
            .map(|token| TokenParams::new(token.id(), token.min_price()))
            .collect();
        claim_eq!(stored, tokens.to_vec());
    }

    #[concordium_test]
    fn test_create_list_requires_tokens() {
        let mut manager = manager();

        let err = manager
            .create_list("0xA", "0xB", &[])
            .expect_err_report("empty tokens");
        claim_eq!(err.field(), Some(TOKENS));

        let incomplete = TokenParams {
            token_id: Some(uint(1)),
            min_price: None,
        };
        let err = manager
            .create_list("0xA", "0xB", &[token_params(2, 1), incomplete])
            .expect_err_report("incomplete token");
        claim_eq!(err.field(), Some(MIN_PRICE));
        claim!(manager.get_lists().is_empty());
    }

    #[concordium_test]
    fn test_add_and_delete_token() {
        let mut manager = listed_manager();

        let token = manager
            .add_token(0, &token_params(2, 30))
            .expect_report("add token");
        claim_eq!(token.min_price(), uint(30));
        claim_eq!(manager.get_list(0).expect_report("list").tokens().len(), 2);

        let err = manager
            .add_token(0, &token_params(2, 40))
            .expect_err_report("duplicate token");
        claim_eq!(err.kind(), ErrorKind::Conflict);

        let err = manager
            .add_token(9, &token_params(3, 40))
            .expect_err_report("unknown list");
        claim_eq!(err.kind(), ErrorKind::NotFound);

        let err = manager
            .add_token(9, &TokenParams::default())
            .expect_err_report("malformed token");
        claim_eq!(err.kind(), ErrorKind::InvalidArgument);

        manager.delete_token(0, uint(2)).expect_report("delete token");
        let err = manager.get_token(0, uint(2)).expect_err_report("deleted token");
        claim_eq!(err.kind(), ErrorKind::NotFound);
        let err = manager.delete_token(0, uint(2)).expect_err_report("deleted token");
        claim_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[concordium_test]
    fn test_make_bid_lookups() {
        let mut manager = listed_manager();

        let mut params = bid_params("0xC", 1, 20);
        params.nft_contract_addr = "0xE".to_string();
        let err = manager.make_bid(params).expect_err_report("unknown collection");
        claim_eq!(err.kind(), ErrorKind::NotFound);

        let err = manager
            .make_bid(bid_params("0xC", 2, 20))
            .expect_err_report("unknown token");
        claim_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[concordium_test]
    fn test_make_bid_forged_signature() {
        let params = bid_params("0xC", 1, 20);
        let mut manager =
            manager_with(MockValidator::new().reject_signature(&params.bidder_signature));
        manager
            .create_list("0xA", "0xB", &[token_params(1, 10)])
            .expect_report("list");

        let err = manager.make_bid(params).expect_err_report("forged signature");
        claim_eq!(err.kind(), ErrorKind::InvalidSignature);
        claim!(manager.get_token(0, uint(1)).expect_report("token").bids().is_empty());
    }

    #[concordium_test]
    fn test_rebid_keeps_one_bid() {
        let mut manager = listed_manager();

        manager.make_bid(bid_params("0xC", 1, 20)).expect_report("bid");
        manager.make_bid(bid_params("0xC", 1, 25)).expect_report("rebid");

        let token = manager.get_token(0, uint(1)).expect_report("token");
        claim_eq!(token.bids().len(), 1);
        claim_eq!(token.bids()[0].erc20amount(), uint(25));
        claim_eq!(token.bids()[0].bidder_signature(), "sig-0xC-25");
    }

    #[concordium_test]
    fn test_delete_bid() {
        let mut manager = listed_manager();
        manager.make_bid(bid_params("0xC", 1, 20)).expect_report("bid");

        manager.delete_bid(0, uint(1), "0xC").expect_report("delete bid");
        let err = manager.get_bid(0, uint(1), "0xC").expect_err_report("deleted bid");
        claim_eq!(err.kind(), ErrorKind::NotFound);

        let err = manager.delete_bid(0, uint(1), "0xC").expect_err_report("deleted bid");
        claim_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[concordium_test]
    fn test_approve_bid_checks() {
        let mut manager =
            manager_with(MockValidator::new().reject_signature("forged-owner-sig"));
        manager
            .create_list("0xA", "0xB", &[token_params(1, 10)])
            .expect_report("list");
        manager.make_bid(bid_params("0xC", 1, 20)).expect_report("bid");

        let err = manager
            .approve_bid(0, uint(1), "0xE", "owner-sig".to_string())
            .expect_err_report("unknown bidder");
        claim_eq!(err.kind(), ErrorKind::NotFound);

        let err = manager
            .approve_bid(0, uint(1), "0xC", "forged-owner-sig".to_string())
            .expect_err_report("forged owner signature");
        claim_eq!(err.kind(), ErrorKind::InvalidSignature);
        claim!(!manager.get_bid(0, uint(1), "0xC").expect_report("bid").is_approved());

        let before = manager.get_bid(0, uint(1), "0xC").expect_report("bid");
        let approved = manager
            .approve_bid(0, uint(1), "0xC", "owner-sig".to_string())
            .expect_report("approve");
        claim_eq!(approved.terms(), before.terms());
        claim_eq!(approved.bidder_signature(), before.bidder_signature());

        let err = manager
            .approve_bid(0, uint(1), "0xC", "owner-sig-2".to_string())
            .expect_err_report("approved twice");
        claim_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[concordium_test]
    fn test_local_delete_token() {
        let mut manager = manager();
        manager
            .create_list("0xA", "0xB", &[token_params(1, 10), token_params(2, 10)])
            .expect_report("list");

        claim!(manager.local_delete_token("0xA", "0xB", uint(1)).expect_report("settle 1"));
        claim_eq!(manager.get_list(0).expect_report("list").tokens().len(), 1);

        // Unknown token and unknown list are ignored
        claim!(!manager.local_delete_token("0xA", "0xB", uint(1)).expect_report("again"));
        claim!(!manager.local_delete_token("0xC", "0xB", uint(2)).expect_report("unknown list"));

        // Last token takes the list with it
        claim!(manager.local_delete_token("0xA", "0xB", uint(2)).expect_report("settle 2"));
        claim!(manager.get_lists().is_empty());
    }

    #[concordium_test]
    fn test_local_delete_token_any_spelling() {
        let owner = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
        let nft = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
        let mut manager = manager();
        manager
            .create_list(owner, nft, &[token_params(1, 10), token_params(2, 10)])
            .expect_report("list");

        let upper_owner = owner.to_uppercase().replacen("0X", "0x", 1);
        claim!(manager
            .local_delete_token(&upper_owner, nft, uint(1))
            .expect_report("uppercase owner"));
        claim!(manager
            .local_delete_token(&owner.to_lowercase(), &nft.to_lowercase(), uint(2))
            .expect_report("lowercase pair"));
        claim!(manager.get_lists().is_empty());
    }

    #[concordium_test]
    fn test_rebid_under_other_spelling() {
        let mut manager = listed_manager();

        manager.make_bid(bid_params("0xC", 1, 20)).expect_report("bid");
        manager.make_bid(bid_params("0xc", 1, 25)).expect_report("rebid");

        let token = manager.get_token(0, uint(1)).expect_report("token");
        claim_eq!(token.bids().len(), 1);
        claim_eq!(token.bids()[0].erc20amount(), uint(25));
    }

    #[concordium_test]
    fn test_events_logged() {
        let mut manager = manager();
        manager
            .create_list("0xA", "0xB", &[token_params(1, 10)])
            .expect_report("list");
        manager.make_bid(bid_params("0xC", 1, 20)).expect_report("bid");
        manager
            .make_bid(bid_params("0xC", 1, 5))
            .expect_err_report("rejected bid");
        manager
            .approve_bid(0, uint(1), "0xC", "owner-sig".to_string())
            .expect_report("approve");
        manager.local_delete_token("0xA", "0xB", uint(1)).expect_report("settle");

        let tags: Vec<u8> = manager.logger().logs().iter().map(|log| log[0]).collect();
        claim_eq!(tags, vec![CREATE_LIST_TAG, BIDING_TAG, APPROVE_TAG, SETTLE_TAG]);
    }
}

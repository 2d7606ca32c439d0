use commons::{
    same_address, AuctionResult, CustomError, ErrorKind, HasEventLog, HasValidator, ListId,
    MemEventLog, MessagePart, TokenId,
};
use concordium_std::*;
use std::sync::{Arc, MutexGuard, PoisonError};

use crate::{
    auction_list::AuctionList,
    bid::Bid,
    external::*,
    manager::{AuctionManager, SharedAuctionManager},
    storage::AuctionStorage,
    token::Token,
};

/// Authenticates owner and bidder requests before forwarding them to the
/// shared manager. Each request holds the manager lock for its whole
/// duration.
pub struct RequestHandler<V, S, L = MemEventLog> {
    validator: Arc<V>,
    manager: SharedAuctionManager<V, S, L>,
}

impl<V: HasValidator, S: AuctionStorage, L: HasEventLog> RequestHandler<V, S, L> {
    pub fn new(manager: SharedAuctionManager<V, S, L>) -> Self {
        let validator = Arc::clone(lock(&manager).validator());
        Self { validator, manager }
    }

    pub fn create_list(&self, params: CreateListParams) -> AuctionResult<AuctionList> {
        self.authorize(
            &params.owner_signature,
            &params.owner_addr,
            &[
                MessagePart::Address(&params.owner_addr),
                MessagePart::Address(&params.nft_contract_addr),
            ],
            "Owner",
        )?;

        lock(&self.manager).create_list(
            &params.owner_addr,
            &params.nft_contract_addr,
            &params.tokens,
        )
    }

    /// Only the owner of the list may delete it.
    pub fn delete_list(&self, params: DeleteListParams) -> AuctionResult<()> {
        let mut manager = lock(&self.manager);
        let list = manager.get_list(params.list_id)?;

        self.authorize(
            &params.owner_signature,
            list.owner_addr(),
            &[MessagePart::Uint(params.list_id.into())],
            "Owner",
        )?;

        manager.delete_list(params.list_id)
    }

    pub fn get_list(&self, list_id: ListId) -> AuctionResult<AuctionList> {
        lock(&self.manager).get_list(list_id)
    }

    pub fn get_lists(&self) -> Vec<AuctionList> {
        lock(&self.manager).get_lists()
    }

    pub fn add_token(&self, params: AddTokenParams) -> AuctionResult<Token> {
        let (token_id, min_price) = params.token.require()?;
        let mut manager = lock(&self.manager);
        let list = manager.get_list(params.list_id)?;

        ensure_owner(&list, &params.owner_addr)?;
        self.authorize(
            &params.owner_signature,
            &params.owner_addr,
            &[
                MessagePart::Uint(params.list_id.into()),
                MessagePart::Uint(token_id),
                MessagePart::Uint(min_price),
                MessagePart::Address(&params.owner_addr),
            ],
            "Owner",
        )?;

        manager.add_token(params.list_id, &params.token)
    }

    pub fn delete_token(&self, params: DeleteTokenParams) -> AuctionResult<()> {
        let mut manager = lock(&self.manager);
        let list = manager.get_list(params.list_id)?;

        ensure_owner(&list, &params.owner_addr)?;
        self.authorize(
            &params.owner_signature,
            &params.owner_addr,
            &[
                MessagePart::Uint(params.list_id.into()),
                MessagePart::Uint(params.token_id),
                MessagePart::Address(&params.owner_addr),
            ],
            "Owner",
        )?;

        manager.delete_token(params.list_id, params.token_id)
    }

    pub fn get_token(&self, list_id: ListId, token_id: TokenId) -> AuctionResult<Token> {
        lock(&self.manager).get_token(list_id, token_id)
    }

    pub fn make_bid(&self, params: MakeBidParams) -> AuctionResult<Bid> {
        lock(&self.manager).make_bid(params)
    }

    /// A bid can only be withdrawn by its bidder.
    pub fn delete_bid(&self, params: DeleteBidParams) -> AuctionResult<()> {
        self.authorize(
            &params.bidder_signature,
            &params.bidder_addr,
            &[
                MessagePart::Uint(params.list_id.into()),
                MessagePart::Uint(params.token_id),
                MessagePart::Address(&params.bidder_addr),
            ],
            "Bidder",
        )?;

        lock(&self.manager).delete_bid(params.list_id, params.token_id, &params.bidder_addr)
    }

    pub fn get_bid(
        &self,
        list_id: ListId,
        token_id: TokenId,
        bidder_addr: &str,
    ) -> AuctionResult<Bid> {
        lock(&self.manager).get_bid(list_id, token_id, bidder_addr)
    }

    pub fn approve_bid(&self, params: ApproveBidParams) -> AuctionResult<Bid> {
        lock(&self.manager).approve_bid(
            params.list_id,
            params.token_id,
            &params.bidder_addr,
            params.owner_signature,
        )
    }

    fn authorize(
        &self,
        signature: &str,
        signer: &str,
        parts: &[MessagePart],
        role: &str,
    ) -> AuctionResult<()> {
        ensure!(
            self.validator.is_signature_valid(signature, signer, parts),
            CustomError::unauthorized(format!("Invalid {} Signature", role))
        );
        Ok(())
    }
}

/// Locks the manager, taking over a poisoned lock. Storage only ever replaces
/// whole lists, so there is no partial write to recover from.
pub(crate) fn lock<V, S, L>(
    manager: &SharedAuctionManager<V, S, L>,
) -> MutexGuard<'_, AuctionManager<V, S, L>> {
    manager.lock().unwrap_or_else(PoisonError::into_inner)
}

fn ensure_owner(list: &AuctionList, owner_addr: &str) -> AuctionResult<()> {
    ensure!(
        same_address(list.owner_addr(), owner_addr),
        CustomError::unauthorized(format!(
            "{} is not the owner of list {}",
            owner_addr,
            list.list_id()
        ))
    );
    Ok(())
}

/// Status code a transport layer answers with.
pub fn status_code<T>(result: &AuctionResult<T>) -> u16 {
    match result {
        Ok(_) => 200,
        Err(err) => match err.kind() {
            ErrorKind::InvalidArgument | ErrorKind::InvalidSignature => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
        },
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::{
        bid::tests::bid_params, manager::tests::manager_with, storage::MemAuctionStorage,
        token::tests::token_params,
    };
    use commons::{
        constants::*,
        test::{uint, MockValidator},
    };

    type TestHandler = RequestHandler<MockValidator, MemAuctionStorage<MockValidator>>;

    fn handler_with(validator: MockValidator) -> TestHandler {
        RequestHandler::new(manager_with(validator).into_shared())
    }

    fn create_params() -> CreateListParams {
        CreateListParams {
            owner_addr: "0xA".to_string(),
            nft_contract_addr: "0xB".to_string(),
            tokens: vec![token_params(1, 10)],
            owner_signature: "owner-sig".to_string(),
        }
    }

    fn listed_handler(validator: MockValidator) -> TestHandler {
        let handler = handler_with(validator);
        handler.create_list(create_params()).expect_report("list");
        handler
    }

    #[concordium_test]
    fn test_create_list_requires_owner_signature() {
        let handler = handler_with(MockValidator::new().reject_signature("owner-sig"));

        let result = handler.create_list(create_params());
        claim_eq!(status_code(&result), 401);
        claim!(handler.get_lists().is_empty());
    }

    #[concordium_test]
    fn test_create_and_read() {
        let handler = listed_handler(MockValidator::new());

        let list = handler.get_list(0);
        claim_eq!(status_code(&list), 200);
        claim_eq!(status_code(&handler.create_list(create_params())), 409);
        claim_eq!(status_code(&handler.get_list(5)), 404);
        claim_eq!(handler.get_token(0, uint(1)).expect_report("token").min_price(), uint(10));
    }

    #[concordium_test]
    fn test_delete_list() {
        let handler = listed_handler(MockValidator::new().reject_signature("forged"));

        let forged = DeleteListParams {
            list_id: 0,
            owner_signature: "forged".to_string(),
        };
        claim_eq!(status_code(&handler.delete_list(forged)), 401);

        let missing = DeleteListParams {
            list_id: 3,
            owner_signature: "owner-sig".to_string(),
        };
        claim_eq!(status_code(&handler.delete_list(missing)), 404);

        let params = DeleteListParams {
            list_id: 0,
            owner_signature: "owner-sig".to_string(),
        };
        handler.delete_list(params).expect_report("delete list");
        claim!(handler.get_lists().is_empty());
    }

    #[concordium_test]
    fn test_add_and_delete_token() {
        let handler = listed_handler(MockValidator::new());

        let not_owner = AddTokenParams {
            list_id: 0,
            token: token_params(2, 5),
            owner_addr: "0xC".to_string(),
            owner_signature: "owner-sig".to_string(),
        };
        claim_eq!(status_code(&handler.add_token(not_owner)), 401);

        let incomplete = AddTokenParams {
            list_id: 0,
            token: TokenParams {
                token_id: Some(uint(2)),
                min_price: None,
            },
            owner_addr: "0xA".to_string(),
            owner_signature: "owner-sig".to_string(),
        };
        let err = handler.add_token(incomplete).expect_err_report("incomplete token");
        claim_eq!(err.field(), Some(MIN_PRICE));

        let params = AddTokenParams {
            list_id: 0,
            token: token_params(2, 5),
            owner_addr: "0xa".to_string(),
            owner_signature: "owner-sig".to_string(),
        };
        handler.add_token(params).expect_report("add token");

        let delete = DeleteTokenParams {
            list_id: 0,
            token_id: uint(2),
            owner_addr: "0xA".to_string(),
            owner_signature: "owner-sig".to_string(),
        };
        handler.delete_token(delete).expect_report("delete token");
        claim_eq!(status_code(&handler.get_token(0, uint(2))), 404);
    }

    #[concordium_test]
    fn test_bid_flow() {
        let handler = listed_handler(MockValidator::new().reject_signature("forged"));

        handler.make_bid(bid_params("0xC", 1, 20)).expect_report("bid");
        claim_eq!(status_code(&handler.make_bid(bid_params("0xC", 1, 5))), 400);

        let approve = ApproveBidParams {
            list_id: 0,
            token_id: uint(1),
            bidder_addr: "0xC".to_string(),
            owner_signature: "approval".to_string(),
        };
        handler.approve_bid(approve).expect_report("approve");
        claim!(handler.get_bid(0, uint(1), "0xC").expect_report("bid").is_approved());

        let forged = DeleteBidParams {
            list_id: 0,
            token_id: uint(1),
            bidder_addr: "0xC".to_string(),
            bidder_signature: "forged".to_string(),
        };
        claim_eq!(status_code(&handler.delete_bid(forged)), 401);

        let delete = DeleteBidParams {
            list_id: 0,
            token_id: uint(1),
            bidder_addr: "0xC".to_string(),
            bidder_signature: "bidder-sig".to_string(),
        };
        handler.delete_bid(delete).expect_report("delete bid");
        claim_eq!(status_code(&handler.get_bid(0, uint(1), "0xC")), 404);
    }

    #[concordium_test]
    fn test_status_codes() {
        claim_eq!(status_code(&Ok::<(), CustomError>(())), 200);
        claim_eq!(
            status_code::<()>(&Err(CustomError::invalid_signature("bad"))),
            400
        );
        claim_eq!(status_code::<()>(&Err(CustomError::conflict("taken"))), 409);
    }
}

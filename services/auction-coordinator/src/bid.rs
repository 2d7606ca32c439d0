use commons::{
    canonical_address, constants::*, AuctionResult, CustomError, Erc20Amount, EthAddress,
    EthSignature, HasValidator, MessagePart, TokenId,
};
use concordium_std::*;
use std::sync::Arc;

use crate::external::MakeBidParams;

/// One bidder's offer on one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct Bid {
    /// Owner of the listed token.
    owner_addr: EthAddress,
    /// Account making the offer.
    bidder_addr: EthAddress,
    /// Collection of the listed token.
    nft_contract_addr: EthAddress,
    token_id: TokenId,
    /// Payment token.
    erc20_contract_addr: EthAddress,
    /// Offered amount of the payment token.
    erc20amount: Erc20Amount,
    bidder_signature: EthSignature,
    /// Set once the owner approves the bid.
    owner_signature: Option<EthSignature>,
}

impl Bid {
    pub fn owner_addr(&self) -> &EthAddress {
        &self.owner_addr
    }

    pub fn bidder_addr(&self) -> &EthAddress {
        &self.bidder_addr
    }

    pub fn nft_contract_addr(&self) -> &EthAddress {
        &self.nft_contract_addr
    }

    pub fn token_id(&self) -> TokenId {
        self.token_id
    }

    pub fn erc20_contract_addr(&self) -> &EthAddress {
        &self.erc20_contract_addr
    }

    pub fn erc20amount(&self) -> Erc20Amount {
        self.erc20amount
    }

    pub fn bidder_signature(&self) -> &EthSignature {
        &self.bidder_signature
    }

    pub fn owner_signature(&self) -> Option<&EthSignature> {
        self.owner_signature.as_ref()
    }

    pub fn is_approved(&self) -> bool {
        self.owner_signature.is_some()
    }

    /// Attaches the owner's approval. The signature itself must be verified by
    /// the caller; a bid can only be approved once.
    pub fn set_owner_signature(&mut self, owner_signature: EthSignature) -> AuctionResult<()> {
        ensure!(
            self.owner_signature.is_none(),
            CustomError::conflict(format!("bid of {} is already approved", self.bidder_addr))
        );
        self.owner_signature = Some(owner_signature);
        Ok(())
    }

    /// The signed terms of the bid, in signing order. Both the bidder and the
    /// approving owner sign these.
    pub fn terms(&self) -> [MessagePart<'_>; 6] {
        bid_terms(
            &self.owner_addr,
            &self.bidder_addr,
            &self.nft_contract_addr,
            self.token_id,
            &self.erc20_contract_addr,
            self.erc20amount,
        )
    }
}

pub fn bid_terms<'a>(
    owner_addr: &'a str,
    bidder_addr: &'a str,
    nft_contract_addr: &'a str,
    token_id: TokenId,
    erc20_contract_addr: &'a str,
    erc20amount: Erc20Amount,
) -> [MessagePart<'a>; 6] {
    [
        MessagePart::Address(owner_addr),
        MessagePart::Address(bidder_addr),
        MessagePart::Address(nft_contract_addr),
        MessagePart::Uint(token_id),
        MessagePart::Address(erc20_contract_addr),
        MessagePart::Uint(erc20amount),
    ]
}

pub struct BidFactory<V> {
    validator: Arc<V>,
}

impl<V: HasValidator> BidFactory<V> {
    pub fn new(validator: Arc<V>) -> Self {
        Self { validator }
    }

    /// Validates every field, stopping at the first failing check, and
    /// verifies the bidder's signature over the bid terms. Addresses are
    /// stored in canonical form.
    pub fn create_bid(&self, params: MakeBidParams) -> AuctionResult<Bid> {
        ensure!(
            self.validator.is_valid_addr(&params.owner_addr),
            CustomError::invalid_argument(
                OWNER_ADDR,
                format!("{} ownerAddr is not a valid address", params.owner_addr)
            )
        );

        ensure!(
            self.validator.is_valid_addr(&params.bidder_addr),
            CustomError::invalid_argument(
                BIDDER_ADDR,
                format!("{} bidderAddr is not a valid address", params.bidder_addr)
            )
        );

        ensure!(
            self.validator.is_valid_nft_contract(&params.nft_contract_addr),
            CustomError::invalid_argument(
                NFT_CONTRACT_ADDR,
                format!("{} is not a valid nft contract address", params.nft_contract_addr)
            )
        );

        ensure!(
            self.validator.is_valid_erc20_contract(&params.erc20_contract_addr),
            CustomError::invalid_argument(
                ERC20_CONTRACT_ADDR,
                format!("{} is not a valid erc20 contract address", params.erc20_contract_addr)
            )
        );

        ensure!(
            !params.erc20amount.is_zero(),
            CustomError::invalid_argument(ERC20_AMOUNT, "erc20amount is not greater than 0")
        );

        let terms = bid_terms(
            &params.owner_addr,
            &params.bidder_addr,
            &params.nft_contract_addr,
            params.token_id,
            &params.erc20_contract_addr,
            params.erc20amount,
        );
        ensure!(
            self.validator
                .is_signature_valid(&params.bidder_signature, &params.bidder_addr, &terms),
            CustomError::invalid_signature("bidderSignature not valid")
        );

        Ok(Bid {
            owner_addr: canonical_address(&params.owner_addr),
            bidder_addr: canonical_address(&params.bidder_addr),
            nft_contract_addr: canonical_address(&params.nft_contract_addr),
            token_id: params.token_id,
            erc20_contract_addr: canonical_address(&params.erc20_contract_addr),
            erc20amount: params.erc20amount,
            bidder_signature: params.bidder_signature,
            owner_signature: None,
        })
    }
}

#[concordium_cfg_test]
pub(crate) mod tests {
    use super::*;
    use commons::{
        test::{uint, MockValidator},
        ErrorKind,
    };

    pub(crate) fn bid_params(bidder: &str, token_id: u64, amount: u64) -> MakeBidParams {
        MakeBidParams {
            owner_addr: "0xA".to_string(),
            bidder_addr: bidder.to_string(),
            nft_contract_addr: "0xB".to_string(),
            token_id: uint(token_id),
            erc20_contract_addr: "0xD".to_string(),
            erc20amount: uint(amount),
            bidder_signature: format!("sig-{}-{}", bidder, amount),
        }
    }

    pub(crate) fn make_bid(bidder: &str, token_id: u64, amount: u64) -> Bid {
        BidFactory::new(Arc::new(MockValidator::new()))
            .create_bid(bid_params(bidder, token_id, amount))
            .expect_report("valid bid")
    }

    fn expect_field(validator: MockValidator, params: MakeBidParams, field: &str) {
        match BidFactory::new(Arc::new(validator)).create_bid(params) {
            Err(err) => claim_eq!(err.field(), Some(field)),
            Ok(_) => fail!("bid with bad {} must be rejected", field),
        }
    }

    #[concordium_test]
    fn test_create_bid() {
        let bid = make_bid("0xC", 1, 20);

        // Addresses are stored lowercase
        claim_eq!(bid.owner_addr(), "0xa");
        claim_eq!(bid.bidder_addr(), "0xc");
        claim_eq!(bid.nft_contract_addr(), "0xb");
        claim_eq!(bid.token_id(), uint(1));
        claim_eq!(bid.erc20_contract_addr(), "0xd");
        claim_eq!(bid.erc20amount(), uint(20));
        claim_eq!(bid.bidder_signature(), "sig-0xC-20");
        claim_eq!(bid.owner_signature(), None);
        claim!(!bid.is_approved());
    }

    #[concordium_test]
    fn test_create_bid_reports_failing_field() {
        let params = bid_params("0xC", 1, 20);

        expect_field(MockValidator::new().reject_addr("0xA"), params.clone(), OWNER_ADDR);
        expect_field(MockValidator::new().reject_addr("0xC"), params.clone(), BIDDER_ADDR);
        expect_field(
            MockValidator::new().reject_nft_contract("0xB"),
            params.clone(),
            NFT_CONTRACT_ADDR,
        );
        expect_field(
            MockValidator::new().reject_erc20_contract("0xD"),
            params.clone(),
            ERC20_CONTRACT_ADDR,
        );
        expect_field(MockValidator::new(), bid_params("0xC", 1, 0), ERC20_AMOUNT);
    }

    #[concordium_test]
    fn test_create_bid_short_circuits() {
        // Both addresses are bad, only the first check is reported
        let validator = MockValidator::new().reject_addr("0xA").reject_addr("0xC");
        expect_field(validator, bid_params("0xC", 1, 0), OWNER_ADDR);
    }

    #[concordium_test]
    fn test_create_bid_bad_signature() {
        let params = bid_params("0xC", 1, 20);
        let validator = MockValidator::new().reject_signature(&params.bidder_signature);

        let err = BidFactory::new(Arc::new(validator))
            .create_bid(params)
            .expect_err_report("forged signature must be rejected");
        claim_eq!(err.kind(), ErrorKind::InvalidSignature);
    }

    #[concordium_test]
    fn test_owner_signature_is_set_once() {
        let mut bid = make_bid("0xC", 1, 20);
        let before = bid.clone();

        bid.set_owner_signature("owner-sig".to_string()).expect_report("first approval");
        claim!(bid.is_approved());
        claim_eq!(bid.owner_signature().map(String::as_str), Some("owner-sig"));
        claim_eq!(bid.erc20amount(), before.erc20amount());
        claim_eq!(bid.bidder_signature(), before.bidder_signature());
        claim_eq!(bid.terms(), before.terms());

        let err = bid
            .set_owner_signature("other-sig".to_string())
            .expect_err_report("second approval must fail");
        claim_eq!(err.kind(), ErrorKind::Conflict);
        claim_eq!(bid.owner_signature().map(String::as_str), Some("owner-sig"));
    }

    #[concordium_test]
    fn test_copy_is_independent() {
        let bid = make_bid("0xC", 1, 20);
        let mut copy = bid.clone();
        copy.set_owner_signature("owner-sig".to_string()).expect_report("approval");

        claim_eq!(copy.bidder_addr(), bid.bidder_addr());
        claim!(!bid.is_approved());
    }
}

use commons::{constants::*, same_address, AuctionResult, CustomError, Erc20Amount, TokenId};
use concordium_std::*;

use crate::{bid::Bid, external::TokenParams};

/// Auction state of one NFT: its minimum price and the bids against it, at
/// most one per bidder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct Token {
    token_id: TokenId,
    /// Smallest acceptable erc20amount.
    min_price: Erc20Amount,
    /// Bids in order of first submission.
    bids: Vec<Bid>,
}

impl Token {
    pub fn id(&self) -> TokenId {
        self.token_id
    }

    pub fn min_price(&self) -> Erc20Amount {
        self.min_price
    }

    pub fn bids(&self) -> &[Bid] {
        &self.bids
    }

    /// Admits `bid` if it meets the minimum price. A bidder that already has a
    /// bid on the token gets it replaced, however its address is spelled.
    pub fn add_bid(&mut self, bid: Bid) -> AuctionResult<()> {
        ensure!(
            bid.erc20amount() >= self.min_price,
            CustomError::invalid_argument(ERC20_AMOUNT, "erc20amount is less than min price")
        );

        match self.position(bid.bidder_addr()) {
            Some(idx) => self.bids[idx] = bid,
            None => self.bids.push(bid),
        }
        Ok(())
    }

    pub fn get_bid(&self, bidder_addr: &str) -> AuctionResult<&Bid> {
        self.bids
            .iter()
            .find(|bid| same_address(bid.bidder_addr(), bidder_addr))
            .ok_or_else(|| no_bid(bidder_addr, self.token_id))
    }

    pub fn get_bid_mut(&mut self, bidder_addr: &str) -> AuctionResult<&mut Bid> {
        let token_id = self.token_id;
        self.bids
            .iter_mut()
            .find(|bid| same_address(bid.bidder_addr(), bidder_addr))
            .ok_or_else(|| no_bid(bidder_addr, token_id))
    }

    pub fn delete_bid(&mut self, bidder_addr: &str) -> AuctionResult<Bid> {
        let idx = self
            .position(bidder_addr)
            .ok_or_else(|| no_bid(bidder_addr, self.token_id))?;
        Ok(self.bids.remove(idx))
    }

    /// Highest bid on the token. Equal amounts resolve to the earliest bid.
    pub fn best_bid(&self) -> Option<&Bid> {
        self.bids.iter().fold(None, |best: Option<&Bid>, bid| match best {
            Some(best) if best.erc20amount() >= bid.erc20amount() => Some(best),
            _ => Some(bid),
        })
    }

    pub fn approved_bid(&self) -> Option<&Bid> {
        self.bids.iter().find(|bid| bid.is_approved())
    }

    fn position(&self, bidder_addr: &str) -> Option<usize> {
        self.bids
            .iter()
            .position(|bid| same_address(bid.bidder_addr(), bidder_addr))
    }
}

fn no_bid(bidder_addr: &str, token_id: TokenId) -> CustomError {
    CustomError::not_found(format!("no bid from {} on tokenId {}", bidder_addr, token_id))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokenFactory;

impl TokenFactory {
    /// Builds an empty token. Both the id and the minimum price are required.
    pub fn create_token(&self, params: &TokenParams) -> AuctionResult<Token> {
        let token_id = params.token_id.ok_or_else(|| {
            CustomError::invalid_argument(TOKEN_ID, "All tokens must have tokenId and minPrice")
        })?;
        let min_price = params.min_price.ok_or_else(|| {
            CustomError::invalid_argument(MIN_PRICE, "All tokens must have tokenId and minPrice")
        })?;

        Ok(Token {
            token_id,
            min_price,
            bids: Vec::new(),
        })
    }
}

#[concordium_cfg_test]
pub(crate) mod tests {
    use super::*;
    use crate::bid::tests::make_bid;
    use commons::{test::uint, ErrorKind};

    pub(crate) fn token_params(token_id: u64, min_price: u64) -> TokenParams {
        TokenParams::new(uint(token_id), uint(min_price))
    }

    pub(crate) fn make_token(token_id: u64, min_price: u64) -> Token {
        TokenFactory
            .create_token(&token_params(token_id, min_price))
            .expect_report("valid token")
    }

    #[concordium_test]
    fn test_create_token() {
        let token = make_token(1, 10);

        claim_eq!(token.id(), uint(1));
        claim_eq!(token.min_price(), uint(10));
        claim!(token.bids().is_empty());
        claim!(token.best_bid().is_none());
    }

    #[concordium_test]
    fn test_create_token_requires_fields() {
        let missing_id = TokenParams {
            token_id: None,
            min_price: Some(uint(10)),
        };
        let err = TokenFactory
            .create_token(&missing_id)
            .expect_err_report("missing tokenId");
        claim_eq!(err.field(), Some(TOKEN_ID));

        let missing_price = TokenParams {
            token_id: Some(uint(1)),
            min_price: None,
        };
        let err = TokenFactory
            .create_token(&missing_price)
            .expect_err_report("missing minPrice");
        claim_eq!(err.field(), Some(MIN_PRICE));
    }

    #[concordium_test]
    fn test_min_price_gate() {
        let mut token = make_token(1, 10);

        let err = token
            .add_bid(make_bid("0xC", 1, 9))
            .expect_err_report("bid below min price");
        claim_eq!(err.field(), Some(ERC20_AMOUNT));
        claim!(token.bids().is_empty());

        token.add_bid(make_bid("0xC", 1, 10)).expect_report("bid at min price");
        token.add_bid(make_bid("0xE", 1, 11)).expect_report("bid above min price");
        claim_eq!(token.bids().len(), 2);
    }

    #[concordium_test]
    fn test_rebid_replaces() {
        let mut token = make_token(1, 10);
        token.add_bid(make_bid("0xC", 1, 20)).expect_report("first bid");
        token.add_bid(make_bid("0xE", 1, 25)).expect_report("other bidder");
        token.add_bid(make_bid("0xC", 1, 30)).expect_report("rebid");

        claim_eq!(token.bids().len(), 2);
        // Replaced in place
        claim_eq!(token.bids()[0].bidder_addr(), "0xc");
        let bid = token.get_bid("0xC").expect_report("bid exists");
        claim_eq!(bid.erc20amount(), uint(30));
        claim_eq!(bid.bidder_signature(), "sig-0xC-30");
    }

    #[concordium_test]
    fn test_rebid_with_other_spelling_replaces() {
        let checksummed = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
        let mut token = make_token(1, 10);
        token.add_bid(make_bid(checksummed, 1, 20)).expect_report("first bid");
        token
            .add_bid(make_bid(&checksummed.to_lowercase(), 1, 30))
            .expect_report("lowercase rebid");
        token
            .add_bid(make_bid(&checksummed.to_uppercase().replacen("0X", "0x", 1), 1, 40))
            .expect_report("uppercase rebid");

        claim_eq!(token.bids().len(), 1);
        claim_eq!(token.bids()[0].erc20amount(), uint(40));
        claim!(token.get_bid(checksummed).is_ok());
        token.delete_bid(&checksummed.to_lowercase()).expect_report("delete");
        claim!(token.bids().is_empty());
    }

    #[concordium_test]
    fn test_get_and_delete_bid() {
        let mut token = make_token(1, 10);
        token.add_bid(make_bid("0xC", 1, 20)).expect_report("bid");

        let err = token.get_bid("0xE").expect_err_report("unknown bidder");
        claim_eq!(err.kind(), ErrorKind::NotFound);

        let deleted = token.delete_bid("0xC").expect_report("delete bid");
        claim_eq!(deleted.erc20amount(), uint(20));
        claim!(token.bids().is_empty());

        let err = token.delete_bid("0xC").expect_err_report("already deleted");
        claim_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[concordium_test]
    fn test_best_and_approved_bid() {
        let mut token = make_token(1, 10);
        token.add_bid(make_bid("0xC", 1, 20)).expect_report("bid");
        token.add_bid(make_bid("0xE", 1, 40)).expect_report("bid");
        token.add_bid(make_bid("0xF", 1, 40)).expect_report("bid");

        let best = token.best_bid().expect_report("has bids");
        claim_eq!(best.bidder_addr(), "0xe");
        claim!(token.approved_bid().is_none());

        token
            .get_bid_mut("0xC")
            .expect_report("bid exists")
            .set_owner_signature("owner-sig".to_string())
            .expect_report("approve");
        claim_eq!(
            token.approved_bid().map(|bid| bid.bidder_addr().as_str()),
            Some("0xc")
        );
    }

    #[concordium_test]
    fn test_copy_is_independent() {
        let mut token = make_token(1, 10);
        token.add_bid(make_bid("0xC", 1, 20)).expect_report("bid");

        let mut copy = token.clone();
        copy.delete_bid("0xC").expect_report("delete on copy");

        claim_eq!(token.bids().len(), 1);
    }
}

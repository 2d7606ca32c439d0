use commons::{constants::*, Erc20Amount, ListId, TokenId};
use concordium_std::*;

use crate::{auction_list::AuctionList, bid::Bid, token::Token};

/// List event data.
#[derive(Debug, Serial)]
pub struct ListEvent<'a> {
    /// Auction list identifier.
    pub list_id: ListId,
    /// Address of the list owner.
    pub owner_addr: &'a String,
    /// NFT collection of the list.
    pub nft_contract_addr: &'a String,
}

/// Token event data.
#[derive(Debug, Serial)]
pub struct TokenEvent {
    /// Auction list identifier.
    pub list_id: ListId,
    /// NFT token identifier.
    pub token_id: TokenId,
    /// Minimum price of the token.
    pub min_price: Erc20Amount,
}

/// Bid event data.
#[derive(Debug, Serial)]
pub struct BidEvent<'a> {
    /// Auction list identifier.
    pub list_id: ListId,
    /// NFT token identifier.
    pub token_id: TokenId,
    /// Bidder address.
    pub bidder_addr: &'a String,
    /// Payment token.
    pub erc20_contract_addr: &'a String,
    /// Bid amount.
    pub erc20amount: Erc20Amount,
}

/// Bid approval event data.
#[derive(Debug, Serial)]
pub struct ApproveEvent<'a> {
    /// Auction list identifier.
    pub list_id: ListId,
    /// NFT token identifier.
    pub token_id: TokenId,
    /// Bidder address.
    pub bidder_addr: &'a String,
    /// Owner's approval signature.
    pub owner_signature: &'a String,
}

/// Settlement event data.
#[derive(Debug, Serial)]
pub struct SettleEvent<'a> {
    /// Address of the previous token owner.
    pub owner_addr: &'a String,
    /// NFT collection.
    pub nft_contract_addr: &'a String,
    /// NFT token identifier.
    pub token_id: TokenId,
    /// Whether the list was removed along with its last token.
    pub list_removed: bool,
}

/// Tagged Custom event to be serialized for the event log.
#[derive(Debug)]
pub enum AuctionEvents<'a> {
    CreateList(ListEvent<'a>),
    DeleteList(ListEvent<'a>),
    AddToken(TokenEvent),
    DeleteToken(TokenEvent),
    MakeBid(BidEvent<'a>),
    DeleteBid(BidEvent<'a>),
    ApproveBid(ApproveEvent<'a>),
    Settle(SettleEvent<'a>),
}

impl<'a> AuctionEvents<'a> {
    fn list_event(list: &'a AuctionList) -> ListEvent<'a> {
        ListEvent {
            list_id: list.list_id(),
            owner_addr: list.owner_addr(),
            nft_contract_addr: list.nft_contract_addr(),
        }
    }

    fn token_event(list_id: ListId, token: &Token) -> TokenEvent {
        TokenEvent {
            list_id,
            token_id: token.id(),
            min_price: token.min_price(),
        }
    }

    fn bid_event(list_id: ListId, bid: &'a Bid) -> BidEvent<'a> {
        BidEvent {
            list_id,
            token_id: bid.token_id(),
            bidder_addr: bid.bidder_addr(),
            erc20_contract_addr: bid.erc20_contract_addr(),
            erc20amount: bid.erc20amount(),
        }
    }

    pub fn create_list(list: &'a AuctionList) -> Self {
        Self::CreateList(Self::list_event(list))
    }

    pub fn delete_list(list: &'a AuctionList) -> Self {
        Self::DeleteList(Self::list_event(list))
    }

    pub fn add_token(list_id: ListId, token: &Token) -> Self {
        Self::AddToken(Self::token_event(list_id, token))
    }

    pub fn delete_token(list_id: ListId, token: &Token) -> Self {
        Self::DeleteToken(Self::token_event(list_id, token))
    }

    pub fn make_bid(list_id: ListId, bid: &'a Bid) -> Self {
        Self::MakeBid(Self::bid_event(list_id, bid))
    }

    pub fn delete_bid(list_id: ListId, bid: &'a Bid) -> Self {
        Self::DeleteBid(Self::bid_event(list_id, bid))
    }

    /// `None` if the bid carries no approval.
    pub fn approve_bid(list_id: ListId, bid: &'a Bid) -> Option<Self> {
        bid.owner_signature().map(|owner_signature| {
            Self::ApproveBid(ApproveEvent {
                list_id,
                token_id: bid.token_id(),
                bidder_addr: bid.bidder_addr(),
                owner_signature,
            })
        })
    }

    pub fn settle(
        owner_addr: &'a String,
        nft_contract_addr: &'a String,
        token_id: TokenId,
        list_removed: bool,
    ) -> Self {
        Self::Settle(SettleEvent {
            owner_addr,
            nft_contract_addr,
            token_id,
            list_removed,
        })
    }
}

impl<'a> Serial for AuctionEvents<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            AuctionEvents::CreateList(event) => {
                out.write_u8(CREATE_LIST_TAG)?;
                event.serial(out)
            }
            AuctionEvents::DeleteList(event) => {
                out.write_u8(DELETE_LIST_TAG)?;
                event.serial(out)
            }
            AuctionEvents::AddToken(event) => {
                out.write_u8(ADD_TOKEN_TAG)?;
                event.serial(out)
            }
            AuctionEvents::DeleteToken(event) => {
                out.write_u8(DELETE_TOKEN_TAG)?;
                event.serial(out)
            }
            AuctionEvents::MakeBid(event) => {
                out.write_u8(BIDING_TAG)?;
                event.serial(out)
            }
            AuctionEvents::DeleteBid(event) => {
                out.write_u8(DELETE_BID_TAG)?;
                event.serial(out)
            }
            AuctionEvents::ApproveBid(event) => {
                out.write_u8(APPROVE_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Settle(event) => {
                out.write_u8(SETTLE_TAG)?;
                event.serial(out)
            }
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::{auction_list::tests::make_list, bid::tests::make_bid, token::tests::make_token};

    #[concordium_test]
    fn test_event_tags() {
        let list = make_list(3, vec![make_token(1, 10)]);
        let bid = make_bid("0xC", 1, 20);

        let bytes = to_bytes(&AuctionEvents::create_list(&list));
        claim_eq!(bytes[0], CREATE_LIST_TAG);
        // Tag, then the little-endian list id
        claim_eq!(&bytes[1..9], &3u64.to_le_bytes());

        claim_eq!(to_bytes(&AuctionEvents::delete_list(&list))[0], DELETE_LIST_TAG);
        claim_eq!(to_bytes(&AuctionEvents::add_token(3, &list.tokens()[0]))[0], ADD_TOKEN_TAG);
        claim_eq!(to_bytes(&AuctionEvents::make_bid(3, &bid))[0], BIDING_TAG);
        claim_eq!(to_bytes(&AuctionEvents::delete_bid(3, &bid))[0], DELETE_BID_TAG);
    }

    #[concordium_test]
    fn test_approve_event_requires_approval() {
        let mut bid = make_bid("0xC", 1, 20);
        claim!(AuctionEvents::approve_bid(0, &bid).is_none());

        bid.set_owner_signature("owner-sig".to_string()).expect_report("approve");
        let event = AuctionEvents::approve_bid(0, &bid).expect_report("approved bid");
        claim_eq!(to_bytes(&event)[0], APPROVE_TAG);
    }
}

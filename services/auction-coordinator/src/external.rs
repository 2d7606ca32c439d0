use commons::{
    constants::*, AuctionResult, CustomError, Erc20Amount, EthAddress, EthSignature, ListId,
    TokenId,
};
use concordium_std::*;

/// A token entry as submitted by the owner. Both fields are required; they are
/// optional here so that incomplete submissions can be reported precisely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, SchemaType)]
pub struct TokenParams {
    pub token_id: Option<TokenId>,
    pub min_price: Option<Erc20Amount>,
}

impl TokenParams {
    pub fn new(token_id: TokenId, min_price: Erc20Amount) -> Self {
        Self {
            token_id: Some(token_id),
            min_price: Some(min_price),
        }
    }

    /// Both fields, or `InvalidArgument` naming the first missing one.
    pub fn require(&self) -> AuctionResult<(TokenId, Erc20Amount)> {
        match (self.token_id, self.min_price) {
            (Some(token_id), Some(min_price)) => Ok((token_id, min_price)),
            (None, _) => bail!(CustomError::invalid_argument(TOKEN_ID, "token must have tokenId")),
            (_, None) => bail!(CustomError::invalid_argument(MIN_PRICE, "token must have minPrice")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct MakeBidParams {
    pub owner_addr: EthAddress,
    pub bidder_addr: EthAddress,
    pub nft_contract_addr: EthAddress,
    pub token_id: TokenId,
    pub erc20_contract_addr: EthAddress,
    pub erc20amount: Erc20Amount,
    /// Bidder's signature over the bid terms.
    pub bidder_signature: EthSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct CreateListParams {
    pub owner_addr: EthAddress,
    pub nft_contract_addr: EthAddress,
    pub tokens: Vec<TokenParams>,
    /// Owner's signature over `(ownerAddr, nftContractAddr)`.
    pub owner_signature: EthSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct DeleteListParams {
    pub list_id: ListId,
    /// List owner's signature over `(listId)`.
    pub owner_signature: EthSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct AddTokenParams {
    pub list_id: ListId,
    pub token: TokenParams,
    pub owner_addr: EthAddress,
    /// Owner's signature over `(listId, tokenId, minPrice, ownerAddr)`.
    pub owner_signature: EthSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct DeleteTokenParams {
    pub list_id: ListId,
    pub token_id: TokenId,
    pub owner_addr: EthAddress,
    /// Owner's signature over `(listId, tokenId, ownerAddr)`.
    pub owner_signature: EthSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct DeleteBidParams {
    pub list_id: ListId,
    pub token_id: TokenId,
    pub bidder_addr: EthAddress,
    /// Bidder's signature over `(listId, tokenId, bidderAddr)`.
    pub bidder_signature: EthSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct ApproveBidParams {
    pub list_id: ListId,
    pub token_id: TokenId,
    pub bidder_addr: EthAddress,
    /// Owner's signature over the bid terms.
    pub owner_signature: EthSignature,
}

/// `TransactionExecuted` log of the settlement contract: the token changed
/// hands on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct SettlementEvent {
    /// Contract that emitted the log.
    pub contract: EthAddress,
    pub owner_addr: EthAddress,
    pub nft_contract_addr: EthAddress,
    pub token_id: TokenId,
}

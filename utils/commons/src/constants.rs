/// Tag for the Create List event.
pub const CREATE_LIST_TAG: u8 = u8::MAX;

/// Tag for the Delete List event.
pub const DELETE_LIST_TAG: u8 = u8::MAX - 1;

/// Tag for the Add Token event.
pub const ADD_TOKEN_TAG: u8 = u8::MAX - 2;

/// Tag for the Delete Token event.
pub const DELETE_TOKEN_TAG: u8 = u8::MAX - 3;

/// Tag for the Biding event.
pub const BIDING_TAG: u8 = u8::MAX - 4;

/// Tag for the Delete Bid event.
pub const DELETE_BID_TAG: u8 = u8::MAX - 5;

/// Tag for the Approve Bid event.
pub const APPROVE_TAG: u8 = u8::MAX - 6;

/// Tag for the on-chain Settlement event.
pub const SETTLE_TAG: u8 = u8::MAX - 7;

pub const LIST_ID: &str = "listId";
pub const OWNER_ADDR: &str = "ownerAddr";
pub const BIDDER_ADDR: &str = "bidderAddr";
pub const NFT_CONTRACT_ADDR: &str = "nftContractAddr";
pub const TOKEN_ID: &str = "tokenId";
pub const MIN_PRICE: &str = "minPrice";
pub const ERC20_CONTRACT_ADDR: &str = "erc20ContractAddr";
pub const ERC20_AMOUNT: &str = "erc20amount";
pub const BIDDER_SIGNATURE: &str = "bidderSignature";
pub const OWNER_SIGNATURE: &str = "ownerSignature";
pub const TOKENS: &str = "tokens";
pub const LIST: &str = "list";
pub const PARAMS: &str = "params";
pub const SETTLEMENT_CONTRACT: &str = "settlementContract";
pub const NFT_CONTRACTS: &str = "nftContracts";
pub const ERC20_CONTRACTS: &str = "erc20Contracts";

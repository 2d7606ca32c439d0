//! It exposes the off-chain auction coordinator: NFT owners list tokens with
//! minimum prices, bidders place signed ERC-20 offers, and owners approve the
//! winning bid for on-chain settlement.
pub use crate::{
    auction_list::*, bid::*, config::*, coordinator::*, events::*, external::*, handler::*,
    manager::*, settlement::*, storage::*, token::*,
};

mod auction_list;
mod bid;
mod config;
mod coordinator;
mod events;
mod external;
mod handler;
mod manager;
mod settlement;
mod storage;
mod token;

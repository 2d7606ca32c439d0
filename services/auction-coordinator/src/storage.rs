use commons::{AuctionResult, CustomError, HasValidator, ListId};
use concordium_std::*;
use std::{collections::BTreeMap, sync::Arc};

use crate::{
    auction_list::{AuctionList, AuctionListFactory},
    token::Token,
};

/// Source of truth for auction lists.
///
/// Implementations never share state with their callers: lists go in and come
/// out by value, so holding or mutating a returned list cannot change what is
/// stored. At most one list may exist per (owner, collection) pair and list
/// ids are handed out sequentially.
pub trait AuctionStorage {
    /// Stores a new list under the next list id and returns a copy of it.
    fn create_list(
        &mut self,
        owner_addr: &str,
        nft_contract_addr: &str,
        tokens: Vec<Token>,
    ) -> AuctionResult<AuctionList>;

    /// Replaces the stored list with the same id.
    fn update_list(&mut self, list: AuctionList) -> AuctionResult<()>;

    /// Removes a list, handing back its last stored state.
    fn delete_list(&mut self, list_id: ListId) -> AuctionResult<AuctionList>;

    fn get_list(&self, list_id: ListId) -> AuctionResult<AuctionList>;

    /// All lists, ordered by list id.
    fn get_lists(&self) -> Vec<AuctionList>;

    /// The list of `owner_addr` for `nft_contract_addr`, if any.
    fn find_list(&self, owner_addr: &str, nft_contract_addr: &str) -> Option<AuctionList> {
        self.get_lists()
            .into_iter()
            .find(|list| list.is_for(owner_addr, nft_contract_addr))
    }
}

/// In-memory storage.
pub struct MemAuctionStorage<V> {
    lists: BTreeMap<ListId, AuctionList>,
    next_list_id: ListId,
    factory: AuctionListFactory<V>,
}

impl<V: HasValidator> MemAuctionStorage<V> {
    pub fn new(validator: Arc<V>) -> Self {
        Self {
            lists: BTreeMap::new(),
            next_list_id: 0,
            factory: AuctionListFactory::new(validator),
        }
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    fn pair_taken(&self, owner_addr: &str, nft_contract_addr: &str, except: Option<ListId>) -> bool {
        self.lists.values().any(|list| {
            Some(list.list_id()) != except && list.is_for(owner_addr, nft_contract_addr)
        })
    }
}

impl<V: HasValidator> AuctionStorage for MemAuctionStorage<V> {
    fn create_list(
        &mut self,
        owner_addr: &str,
        nft_contract_addr: &str,
        tokens: Vec<Token>,
    ) -> AuctionResult<AuctionList> {
        ensure!(
            !self.pair_taken(owner_addr, nft_contract_addr, None),
            CustomError::conflict(format!(
                "there is already a list with ownerAddr {} and nftContractAddr {}",
                owner_addr, nft_contract_addr
            ))
        );

        let list =
            self.factory
                .create_list(self.next_list_id, owner_addr, nft_contract_addr, tokens)?;
        // The id is only consumed once the list is accepted
        self.next_list_id += 1;
        self.lists.insert(list.list_id(), list.clone());
        Ok(list)
    }

    fn update_list(&mut self, list: AuctionList) -> AuctionResult<()> {
        list.check_well_formed()?;

        ensure!(
            self.lists.contains_key(&list.list_id()),
            not_found(list.list_id())
        );

        ensure!(
            !self.pair_taken(list.owner_addr(), list.nft_contract_addr(), Some(list.list_id())),
            CustomError::conflict(format!(
                "there is already a list with ownerAddr {} and nftContractAddr {}",
                list.owner_addr(),
                list.nft_contract_addr()
            ))
        );

        self.lists.insert(list.list_id(), list);
        Ok(())
    }

    fn delete_list(&mut self, list_id: ListId) -> AuctionResult<AuctionList> {
        self.lists.remove(&list_id).ok_or_else(|| not_found(list_id))
    }

    fn get_list(&self, list_id: ListId) -> AuctionResult<AuctionList> {
        self.lists.get(&list_id).cloned().ok_or_else(|| not_found(list_id))
    }

    fn get_lists(&self) -> Vec<AuctionList> {
        self.lists.values().cloned().collect()
    }

    fn find_list(&self, owner_addr: &str, nft_contract_addr: &str) -> Option<AuctionList> {
        self.lists
            .values()
            .find(|list| list.is_for(owner_addr, nft_contract_addr))
            .cloned()
    }
}

fn not_found(list_id: ListId) -> CustomError {
    CustomError::not_found(format!("no list with listId {}", list_id))
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::{bid::tests::make_bid, token::tests::make_token};
    use commons::{
        constants::*,
        test::{uint, MockValidator},
        ErrorKind,
    };

    const OWNER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const NFT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn storage() -> MemAuctionStorage<MockValidator> {
        MemAuctionStorage::new(Arc::new(MockValidator::new()))
    }

    #[concordium_test]
    fn test_create_list_assigns_sequential_ids() {
        let mut storage = storage();

        let first = storage
            .create_list("0xA", "0xB", vec![make_token(1, 10)])
            .expect_report("first list");
        let second = storage
            .create_list("0xA", "0xE", vec![make_token(1, 10)])
            .expect_report("second list");

        claim_eq!(first.list_id(), 0);
        claim_eq!(second.list_id(), 1);
        claim_eq!(storage.len(), 2);
    }

    #[concordium_test]
    fn test_create_list_conflict() {
        let mut storage = storage();
        storage
            .create_list("0xA", "0xB", vec![make_token(1, 10)])
            .expect_report("first list");

        let err = storage
            .create_list("0xA", "0xB", vec![make_token(2, 10)])
            .expect_err_report("same owner and collection");
        claim_eq!(err.kind(), ErrorKind::Conflict);
        claim_eq!(storage.len(), 1);
    }

    #[concordium_test]
    fn test_create_list_conflict_ignores_case() {
        let mut storage = storage();
        let list = storage
            .create_list(OWNER, NFT, vec![make_token(1, 10)])
            .expect_report("checksummed spelling");
        claim_eq!(list.owner_addr(), &OWNER.to_lowercase());
        claim_eq!(list.nft_contract_addr(), &NFT.to_lowercase());

        let err = storage
            .create_list(&OWNER.to_lowercase(), &NFT.to_lowercase(), vec![make_token(2, 10)])
            .expect_err_report("lowercase spelling");
        claim_eq!(err.kind(), ErrorKind::Conflict);

        let upper_owner = OWNER.to_uppercase().replacen("0X", "0x", 1);
        let err = storage
            .create_list(&upper_owner, NFT, vec![make_token(2, 10)])
            .expect_err_report("uppercase spelling");
        claim_eq!(err.kind(), ErrorKind::Conflict);
        claim_eq!(storage.len(), 1);

        let found = storage.find_list(&upper_owner, &NFT.to_uppercase()).expect_report("found");
        claim_eq!(found.list_id(), 0);
    }

    #[concordium_test]
    fn test_update_list_pair_conflict() {
        let mut storage = storage();
        storage
            .create_list("0xA", "0xB", vec![make_token(1, 10)])
            .expect_report("first list");
        storage
            .create_list("0xA", "0xE", vec![make_token(1, 10)])
            .expect_report("second list");

        // A list arriving in serialized form under id 1 but for the pair of
        // list 0
        let mut bytes = to_bytes(&storage.get_list(0).expect_report("first list"));
        bytes[..8].copy_from_slice(&1u64.to_le_bytes());
        let moved: AuctionList = from_bytes(&bytes).expect_report("valid list bytes");
        claim_eq!(moved.list_id(), 1);

        let err = storage.update_list(moved).expect_err_report("pair already taken");
        claim_eq!(err.kind(), ErrorKind::Conflict);
        claim!(storage
            .get_list(1)
            .expect_report("second list")
            .is_for("0xA", "0xE"));
    }

    #[concordium_test]
    fn test_rejected_list_keeps_id() {
        let mut storage = MemAuctionStorage::new(Arc::new(MockValidator::new().reject_addr("0xZ")));

        storage
            .create_list("0xZ", "0xB", vec![])
            .expect_err_report("invalid owner");
        let list = storage
            .create_list("0xA", "0xB", vec![])
            .expect_report("valid list");
        claim_eq!(list.list_id(), 0);
    }

    #[concordium_test]
    fn test_returned_lists_are_copies() {
        let mut storage = storage();
        let mut created = storage
            .create_list("0xA", "0xB", vec![make_token(1, 10)])
            .expect_report("list");

        created.add_token(make_token(2, 10)).expect_report("add on copy");
        let mut fetched = storage.get_list(0).expect_report("stored list");
        claim_eq!(fetched.tokens().len(), 1);

        fetched.delete_token(uint(1)).expect_report("delete on copy");
        claim_eq!(storage.get_list(0).expect_report("stored list").tokens().len(), 1);
        claim_eq!(storage.get_lists()[0].tokens().len(), 1);

        storage.update_list(fetched).expect_report("explicit update");
        claim!(storage.get_list(0).expect_report("stored list").is_empty());
    }

    #[concordium_test]
    fn test_update_list() {
        let mut storage = storage();
        let mut list = storage
            .create_list("0xA", "0xB", vec![make_token(1, 10)])
            .expect_report("list");

        list.get_token_mut(uint(1))
            .expect_report("token")
            .add_bid(make_bid("0xC", 1, 20))
            .expect_report("bid");
        storage.update_list(list.clone()).expect_report("update");

        let stored = storage.get_list(0).expect_report("stored list");
        claim_eq!(stored, list);

        storage.delete_list(0).expect_report("delete");
        let err = storage.update_list(list).expect_err_report("deleted list");
        claim_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[concordium_test]
    fn test_update_list_rejects_malformed() {
        let mut storage = storage();
        let mut list = storage
            .create_list("0xA", "0xB", vec![make_token(1, 10)])
            .expect_report("list");

        // Bid made for another token id
        list.get_token_mut(uint(1))
            .expect_report("token")
            .add_bid(make_bid("0xC", 7, 20))
            .expect_report("bid");

        let err = storage.update_list(list).expect_err_report("malformed list");
        claim_eq!(err.field(), Some(LIST));
        claim!(storage
            .get_list(0)
            .expect_report("stored list")
            .get_token(uint(1))
            .expect_report("token")
            .bids()
            .is_empty());
    }

    #[concordium_test]
    fn test_delete_and_get() {
        let mut storage = storage();
        storage
            .create_list("0xA", "0xB", vec![make_token(1, 10)])
            .expect_report("list");

        let deleted = storage.delete_list(0).expect_report("delete");
        claim_eq!(deleted.owner_addr(), "0xa");
        claim!(storage.get_lists().is_empty());

        let err = storage.delete_list(0).expect_err_report("already deleted");
        claim_eq!(err.kind(), ErrorKind::NotFound);
        let err = storage.get_list(0).expect_err_report("already deleted");
        claim_eq!(err.kind(), ErrorKind::NotFound);

        // The pair is free again, ids keep growing
        let list = storage
            .create_list("0xA", "0xB", vec![])
            .expect_report("recreated list");
        claim_eq!(list.list_id(), 1);
    }

    #[concordium_test]
    fn test_get_lists_and_find() {
        let mut storage = storage();
        for nft in ["0xB", "0xE", "0xF"] {
            storage
                .create_list("0xA", nft, vec![make_token(1, 10)])
                .expect_report("list");
        }

        let ids: Vec<ListId> = storage.get_lists().iter().map(AuctionList::list_id).collect();
        claim_eq!(ids, vec![0, 1, 2]);

        let found = storage.find_list("0xA", "0xE").expect_report("list for 0xE");
        claim_eq!(found.list_id(), 1);
        claim!(storage.find_list("0xC", "0xE").is_none());
    }
}

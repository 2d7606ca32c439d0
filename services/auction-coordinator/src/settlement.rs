use commons::{
    same_address, AuctionResult, CustomError, EthAddress, HasEventLog, HasValidator, MemEventLog,
};
use concordium_std::*;
use std::sync::mpsc::Receiver;

use crate::{
    external::SettlementEvent, handler::lock, manager::SharedAuctionManager,
    storage::AuctionStorage,
};

/// Outcome counts of a settlement run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettlementReport {
    /// Events that removed a token.
    pub applied: usize,
    /// Events about tokens that were not listed.
    pub ignored: usize,
    /// Events from contracts other than the settlement contract.
    pub rejected: usize,
}

/// Drops settled tokens from the books when the settlement contract reports
/// an executed transaction.
pub struct SettlementListener<V, S, L = MemEventLog> {
    settlement_contract: EthAddress,
    manager: SharedAuctionManager<V, S, L>,
}

impl<V: HasValidator, S: AuctionStorage, L: HasEventLog> SettlementListener<V, S, L> {
    pub fn new(settlement_contract: EthAddress, manager: SharedAuctionManager<V, S, L>) -> Self {
        Self {
            settlement_contract,
            manager,
        }
    }

    pub fn settlement_contract(&self) -> &EthAddress {
        &self.settlement_contract
    }

    /// Applies one event. Returns whether a token was removed.
    pub fn handle(&self, event: &SettlementEvent) -> AuctionResult<bool> {
        ensure!(
            same_address(&event.contract, &self.settlement_contract),
            CustomError::unauthorized(format!(
                "{} is not the settlement contract",
                event.contract
            ))
        );

        lock(&self.manager).local_delete_token(
            &event.owner_addr,
            &event.nft_contract_addr,
            event.token_id,
        )
    }

    /// Applies events until every sender is gone.
    pub fn run(&self, events: Receiver<SettlementEvent>) -> SettlementReport {
        let mut report = SettlementReport::default();
        for event in events {
            match self.handle(&event) {
                Ok(true) => report.applied += 1,
                Ok(false) => report.ignored += 1,
                Err(_) => report.rejected += 1,
            }
        }
        report
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::{handler::RequestHandler, manager::tests::manager_with, token::tests::token_params};
    use commons::{
        constants::*,
        test::{uint, MockValidator},
        ErrorKind,
    };
    use std::{sync::mpsc, thread};

    const MARKET: &str = "0x9a676e781a523b5d0c0e43731313a708cb607508";

    fn settlement_event(contract: &str, token_id: u64) -> SettlementEvent {
        SettlementEvent {
            contract: contract.to_string(),
            owner_addr: "0xA".to_string(),
            nft_contract_addr: "0xB".to_string(),
            token_id: uint(token_id),
        }
    }

    #[concordium_test]
    fn test_handle() {
        let mut manager = manager_with(MockValidator::new());
        manager
            .create_list("0xA", "0xB", &[token_params(1, 10), token_params(2, 10)])
            .expect_report("list");
        let listener = SettlementListener::new(MARKET.to_string(), manager.into_shared());
        claim_eq!(listener.settlement_contract(), MARKET);

        let err = listener
            .handle(&settlement_event("0xE", 1))
            .expect_err_report("foreign contract");
        claim_eq!(err.kind(), ErrorKind::Unauthorized);

        // Case of the contract address does not matter
        claim!(listener
            .handle(&settlement_event(&MARKET.to_uppercase().replacen("0X", "0x", 1), 1))
            .expect_report("settled"));
        claim!(!listener
            .handle(&settlement_event(MARKET, 1))
            .expect_report("already settled"));

        let tags: Vec<u8> = lock(&listener.manager)
            .logger()
            .logs()
            .iter()
            .map(|log| log[0])
            .collect();
        claim_eq!(tags, vec![CREATE_LIST_TAG, SETTLE_TAG]);
    }

    #[concordium_test]
    fn test_run_drains_channel() {
        let mut manager = manager_with(MockValidator::new());
        manager
            .create_list("0xA", "0xB", &[token_params(1, 10), token_params(2, 10)])
            .expect_report("list");
        let shared = manager.into_shared();
        let listener = SettlementListener::new(MARKET.to_string(), shared.clone());
        let handler = RequestHandler::new(shared);

        let (sender, receiver) = mpsc::channel();
        let worker = thread::spawn(move || listener.run(receiver));

        sender.send(settlement_event(MARKET, 1)).expect_report("send");
        sender.send(settlement_event("0xE", 2)).expect_report("send");
        sender.send(settlement_event(MARKET, 7)).expect_report("send");
        sender.send(settlement_event(MARKET, 2)).expect_report("send");
        drop(sender);

        let report = worker.join().expect_report("listener thread");
        claim_eq!(
            report,
            SettlementReport {
                applied: 2,
                ignored: 1,
                rejected: 1,
            }
        );
        // Both tokens are gone, so is the list
        claim!(handler.get_lists().is_empty());
    }
}

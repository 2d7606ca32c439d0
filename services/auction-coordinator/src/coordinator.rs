use commons::{AllowListRegistry, AuctionResult, EcdsaValidator};
use concordium_std::concordium_cfg_test;
use std::sync::Arc;

use crate::{
    config::InitParams, handler::RequestHandler, manager::AuctionManager,
    settlement::SettlementListener, storage::MemAuctionStorage,
};

pub type DefaultValidator = EcdsaValidator<AllowListRegistry>;

pub type DefaultStorage = MemAuctionStorage<DefaultValidator>;

/// Request handler and settlement listener working on one shared manager.
pub struct Coordinator {
    pub handler: RequestHandler<DefaultValidator, DefaultStorage>,
    pub listener: SettlementListener<DefaultValidator, DefaultStorage>,
}

/// Wires an in-memory coordinator from its init parameters.
pub fn init(params: &InitParams) -> AuctionResult<Coordinator> {
    let validator = Arc::new(params.validator()?);
    let storage = MemAuctionStorage::new(Arc::clone(&validator));
    let manager = AuctionManager::new(validator, storage).into_shared();

    Ok(Coordinator {
        listener: SettlementListener::new(
            params.settlement_contract.clone(),
            Arc::clone(&manager),
        ),
        handler: RequestHandler::new(manager),
    })
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::{
        bid::bid_terms,
        external::{
            ApproveBidParams, CreateListParams, MakeBidParams, SettlementEvent, TokenParams,
        },
        handler::status_code,
    };
    use alloy_primitives::{eip191_hash_message, hex, keccak256, Address, U256};
    use commons::{encode_packed, test::uint, ErrorKind, MessagePart, Uint256};
    use concordium_std::{claim, claim_eq, concordium_test, ExpectErrReport, ExpectReport};
    use k256::ecdsa::SigningKey;

    const MARKET: &str = "0x9a676e781a523b5d0c0e43731313a708cb607508";
    const NFT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const ERC20: &str = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512";

    struct Account {
        key: SigningKey,
        addr: String,
    }

    impl Account {
        fn new(seed: u8) -> Self {
            let key = SigningKey::from_slice(&[seed; 32]).expect_report("valid secret key");
            let addr = Address::from_private_key(&key).to_string();
            Self { key, addr }
        }

        fn sign(&self, parts: &[MessagePart]) -> String {
            let digest = keccak256(encode_packed(parts).expect_report("encodable parts"));
            let prehash = eip191_hash_message(digest);
            let (signature, recovery_id) = self
                .key
                .sign_prehash_recoverable(prehash.as_slice())
                .expect_report("signing succeeds");
            let mut bytes = signature.to_bytes().to_vec();
            bytes.push(27 + recovery_id.to_byte());
            format!("0x{}", hex::encode(bytes))
        }
    }

    fn coordinator() -> Coordinator {
        init(&InitParams {
            settlement_contract: MARKET.to_string(),
            nft_contracts: vec![NFT.to_string()],
            erc20_contracts: vec![ERC20.to_string()],
        })
        .expect_report("valid params")
    }

    #[concordium_test]
    fn test_signed_auction() {
        let coordinator = coordinator();
        let owner = Account::new(0x21);
        let bidder = Account::new(0x42);

        let owner_signature =
            owner.sign(&[MessagePart::Address(&owner.addr), MessagePart::Address(NFT)]);
        coordinator
            .handler
            .create_list(CreateListParams {
                owner_addr: owner.addr.clone(),
                nft_contract_addr: NFT.to_string(),
                tokens: vec![TokenParams::new(uint(1), uint(10))],
                owner_signature,
            })
            .expect_report("create list");

        let terms = bid_terms(&owner.addr, &bidder.addr, NFT, uint(1), ERC20, uint(20));
        let bid = MakeBidParams {
            owner_addr: owner.addr.clone(),
            bidder_addr: bidder.addr.clone(),
            nft_contract_addr: NFT.to_string(),
            token_id: uint(1),
            erc20_contract_addr: ERC20.to_string(),
            erc20amount: uint(20),
            bidder_signature: bidder.sign(&terms),
        };

        // Signed by the wrong account
        let mut forged = bid.clone();
        forged.bidder_signature = owner.sign(&terms);
        let err = coordinator.handler.make_bid(forged).expect_err_report("forged bid");
        claim_eq!(err.kind(), ErrorKind::InvalidSignature);

        coordinator.handler.make_bid(bid).expect_report("signed bid");

        // Only the owner can approve
        let approval = ApproveBidParams {
            list_id: 0,
            token_id: uint(1),
            bidder_addr: bidder.addr.clone(),
            owner_signature: bidder.sign(&terms),
        };
        claim_eq!(status_code(&coordinator.handler.approve_bid(approval)), 400);

        let approval = ApproveBidParams {
            list_id: 0,
            token_id: uint(1),
            bidder_addr: bidder.addr.clone(),
            owner_signature: owner.sign(&terms),
        };
        let approved = coordinator.handler.approve_bid(approval).expect_report("approve");
        claim!(approved.is_approved());

        let settled = coordinator
            .listener
            .handle(&SettlementEvent {
                contract: MARKET.to_string(),
                owner_addr: owner.addr.clone(),
                nft_contract_addr: NFT.to_string(),
                token_id: uint(1),
            })
            .expect_report("settlement");
        claim!(settled);
        claim!(coordinator.handler.get_lists().is_empty());
    }

    #[concordium_test]
    fn test_unknown_collection() {
        let coordinator = coordinator();
        let owner = Account::new(0x21);
        let other_nft = ERC20;

        let result = coordinator.handler.create_list(CreateListParams {
            owner_addr: owner.addr.clone(),
            nft_contract_addr: other_nft.to_string(),
            tokens: vec![TokenParams::new(uint(1), uint(10))],
            owner_signature: owner.sign(&[
                MessagePart::Address(&owner.addr),
                MessagePart::Address(other_nft),
            ]),
        });
        claim_eq!(status_code(&result), 400);
    }

    #[concordium_test]
    fn test_one_list_per_account() {
        let coordinator = coordinator();
        let owner = Account::new(0x21);
        let lower_owner = owner.addr.to_lowercase();
        let lower_nft = NFT.to_lowercase();

        let create = |owner_addr: &str, nft: &str, token_id: u64| CreateListParams {
            owner_addr: owner_addr.to_string(),
            nft_contract_addr: nft.to_string(),
            tokens: vec![TokenParams::new(uint(token_id), uint(10))],
            owner_signature: owner
                .sign(&[MessagePart::Address(owner_addr), MessagePart::Address(nft)]),
        };

        let first = coordinator.handler.create_list(create(owner.addr.as_str(), NFT, 1));
        claim_eq!(status_code(&first), 200);
        let second = coordinator
            .handler
            .create_list(create(lower_owner.as_str(), lower_nft.as_str(), 2));
        claim_eq!(status_code(&second), 409);
        claim_eq!(coordinator.handler.get_lists().len(), 1);

        // The settlement contract may spell the addresses differently
        let settled = coordinator
            .listener
            .handle(&SettlementEvent {
                contract: MARKET.to_uppercase().replacen("0X", "0x", 1),
                owner_addr: owner.addr.to_uppercase().replacen("0X", "0x", 1),
                nft_contract_addr: lower_nft.clone(),
                token_id: uint(1),
            })
            .expect_report("settlement");
        claim!(settled);
        claim!(coordinator.handler.get_lists().is_empty());
    }

    #[concordium_test]
    fn test_uint256_token_and_amount() {
        let coordinator = coordinator();
        let owner = Account::new(0x21);
        let bidder = Account::new(0x42);
        claim_eq!(coordinator.listener.settlement_contract(), MARKET);

        // Hash derived id and 100 tokens of 18 decimals, both beyond u64
        let token_id = Uint256::from(U256::from_be_bytes(keccak256("auction").0));
        let min_price = Uint256::from(U256::from(10_000_000_000_000_000_000u128));
        let amount = Uint256::from(U256::from(100_000_000_000_000_000_000u128));
        claim!(amount > Uint256::from(u64::MAX));

        coordinator
            .handler
            .create_list(CreateListParams {
                owner_addr: owner.addr.clone(),
                nft_contract_addr: NFT.to_string(),
                tokens: vec![TokenParams::new(token_id, min_price)],
                owner_signature: owner
                    .sign(&[MessagePart::Address(&owner.addr), MessagePart::Address(NFT)]),
            })
            .expect_report("create list");

        let terms = bid_terms(&owner.addr, &bidder.addr, NFT, token_id, ERC20, amount);
        let bid = MakeBidParams {
            owner_addr: owner.addr.clone(),
            bidder_addr: bidder.addr.clone(),
            nft_contract_addr: NFT.to_string(),
            token_id,
            erc20_contract_addr: ERC20.to_string(),
            erc20amount: amount,
            bidder_signature: bidder.sign(&terms),
        };

        // Signed amount differs in the high bits only
        let mut tampered = bid.clone();
        tampered.erc20amount = Uint256::from(amount.as_u256() + (U256::from(1u64) << 200usize));
        let err = coordinator.handler.make_bid(tampered).expect_err_report("tampered amount");
        claim_eq!(err.kind(), ErrorKind::InvalidSignature);

        coordinator.handler.make_bid(bid).expect_report("signed bid");
        let stored = coordinator
            .handler
            .get_bid(0, token_id, &bidder.addr)
            .expect_report("stored bid");
        claim_eq!(stored.erc20amount(), amount);
        claim_eq!(stored.token_id(), token_id);

        let approved = coordinator
            .handler
            .approve_bid(ApproveBidParams {
                list_id: 0,
                token_id,
                bidder_addr: bidder.addr.to_lowercase(),
                owner_signature: owner.sign(&terms),
            })
            .expect_report("approve");
        claim!(approved.is_approved());
    }
}

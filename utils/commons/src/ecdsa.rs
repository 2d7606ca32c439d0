use crate::{ContractRegistry, EthAddress, HasValidator, MessagePart};
use alloy_primitives::{hex, keccak256, Address, Signature};
use concordium_std::concordium_cfg_test;
use std::str::FromStr;

/// Parses a 20 byte hex address with an optional `0x` or `0X` prefix.
///
/// All-lowercase and all-uppercase input is accepted as is, mixed-case input
/// must carry a valid EIP-55 checksum.
pub fn parse_address(addr: &str) -> Option<Address> {
    let digits = strip_hex_prefix(addr);
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let address = Address::from_str(digits).ok()?;

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && address.to_checksum(None)[2..] != *digits {
        return None;
    }

    Some(address)
}

/// The spelling an address is stored and compared under. Checksummed,
/// lowercase and uppercase spellings of one address share it.
pub fn canonical_address(addr: &str) -> EthAddress {
    addr.to_ascii_lowercase()
}

/// Whether `a` and `b` spell the same address.
pub fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Solidity `abi.encodePacked` of the message parts. Returns `None` if an
/// address part does not parse.
pub fn encode_packed(parts: &[MessagePart]) -> Option<Vec<u8>> {
    let mut buffer = Vec::with_capacity(parts.len() * 32);
    for part in parts {
        match part {
            MessagePart::Address(addr) => buffer.extend_from_slice(parse_address(addr)?.as_slice()),
            MessagePart::Uint(value) => buffer.extend_from_slice(&value.to_be_bytes()),
        }
    }
    Some(buffer)
}

/// Offline validator for Ethereum addresses and personal-message signatures.
///
/// Signed messages are `keccak256(abi.encodePacked(parts))`, signed with the
/// EIP-191 prefix (what `web3.eth.accounts.sign` produces). Contract checks
/// are delegated to the injected registry.
#[derive(Debug, Clone)]
pub struct EcdsaValidator<R> {
    registry: R,
}

impl<R: ContractRegistry> EcdsaValidator<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    fn recover_signer(signature: &str, parts: &[MessagePart]) -> Option<Address> {
        let bytes = hex::decode(strip_hex_prefix(signature)).ok()?;
        let signature = Signature::from_raw(&bytes).ok()?;
        let digest = keccak256(encode_packed(parts)?);
        signature.recover_address_from_msg(digest.as_slice()).ok()
    }
}

impl<R: ContractRegistry> HasValidator for EcdsaValidator<R> {
    fn is_valid_addr(&self, addr: &str) -> bool {
        parse_address(addr).is_some()
    }

    fn is_valid_nft_contract(&self, addr: &str) -> bool {
        parse_address(addr)
            .map(|contract| self.registry.supports_erc721(&contract))
            .unwrap_or(false)
    }

    fn is_valid_erc20_contract(&self, addr: &str) -> bool {
        parse_address(addr)
            .map(|contract| self.registry.supports_erc20(&contract))
            .unwrap_or(false)
    }

    fn is_signature_valid(&self, signature: &str, signer: &str, parts: &[MessagePart]) -> bool {
        match (parse_address(signer), Self::recover_signer(signature, parts)) {
            (Some(expected), Some(recovered)) => expected == recovered,
            _ => false,
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::{test::uint, AllowListRegistry, Uint256};
    use alloy_primitives::{eip191_hash_message, U256};
    use concordium_std::{claim, claim_eq, concordium_test, ExpectReport};
    use k256::ecdsa::SigningKey;

    const NFT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const ERC20: &str = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512";
    const OWNER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    fn signing_key(seed: u8) -> SigningKey {
        SigningKey::from_slice(&[seed; 32]).expect_report("valid secret key")
    }

    fn sign(key: &SigningKey, parts: &[MessagePart]) -> String {
        let digest = keccak256(encode_packed(parts).expect_report("encodable parts"));
        let prehash = eip191_hash_message(digest);
        let (signature, recovery_id) = key
            .sign_prehash_recoverable(prehash.as_slice())
            .expect_report("signing succeeds");
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(27 + recovery_id.to_byte());
        format!("0x{}", hex::encode(bytes))
    }

    fn validator() -> EcdsaValidator<AllowListRegistry> {
        let registry = AllowListRegistry::from_hex(&[NFT], &[ERC20]).expect_report("valid lists");
        EcdsaValidator::new(registry)
    }

    #[concordium_test]
    fn test_parse_address() {
        claim!(parse_address(OWNER).is_some());
        claim!(parse_address(&OWNER.to_uppercase().replacen("0X", "0x", 1)).is_some());
        claim!(parse_address(&OWNER[2..]).is_some());
        claim!(parse_address(&OWNER.replacen("0x", "0X", 1)).is_some());
        // Valid checksum
        claim!(parse_address(NFT).is_some());
        // Broken checksum
        claim!(parse_address("0x5fbDB2315678afecb367f032d93F642f64180aa3").is_none());
        claim!(parse_address("0x5FbDB2315678afecb367f032d93F642f64180aa").is_none());
        claim!(parse_address("0xA").is_none());
        claim!(parse_address("0xzz9DB2315678afecb367f032d93F642f64180aa3").is_none());
    }

    #[concordium_test]
    fn test_encode_packed() {
        let encoded = encode_packed(&[MessagePart::Address(OWNER), MessagePart::Uint(uint(258))])
            .expect_report("encodable parts");

        claim_eq!(encoded.len(), 20 + 32);
        claim_eq!(&encoded[..20], parse_address(OWNER).expect_report("valid").as_slice());
        claim!(encoded[20..50].iter().all(|b| *b == 0));
        claim_eq!(&encoded[50..], &[1u8, 2]);

        claim!(encode_packed(&[MessagePart::Address("0xA")]).is_none());

        let wide = Uint256::from(U256::MAX);
        let encoded = encode_packed(&[MessagePart::Uint(wide)]).expect_report("uint only");
        claim_eq!(encoded, vec![0xffu8; 32]);
    }

    #[concordium_test]
    fn test_canonical_address() {
        let checksummed = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

        claim_eq!(canonical_address(checksummed), OWNER);
        claim_eq!(canonical_address(&OWNER.to_uppercase()), OWNER);
        claim!(same_address(checksummed, OWNER));
        claim!(same_address(&OWNER.replacen("0x", "0X", 1), checksummed));
        claim!(!same_address(OWNER, NFT));
    }

    #[concordium_test]
    fn test_contract_checks() {
        let validator = validator();

        claim!(validator.is_valid_nft_contract(NFT));
        claim!(!validator.is_valid_nft_contract(ERC20));
        claim!(validator.is_valid_erc20_contract(ERC20));
        claim!(!validator.is_valid_erc20_contract("0xA"));
        claim!(validator.is_valid_addr(OWNER));
        claim!(!validator.is_valid_addr("fakeAddr"));
    }

    #[concordium_test]
    fn test_signature_roundtrip() {
        let validator = validator();
        let key = signing_key(0x11);
        let signer = Address::from_private_key(&key).to_string();
        let parts = [
            MessagePart::Address(OWNER),
            MessagePart::Address(&signer),
            MessagePart::Address(NFT),
            MessagePart::Uint(uint(1)),
            MessagePart::Address(ERC20),
            MessagePart::Uint(uint(20)),
        ];

        let signature = sign(&key, &parts);

        claim!(validator.is_signature_valid(&signature, &signer, &parts));
        claim!(validator.is_signature_valid(&signature, &signer.to_lowercase(), &parts));

        // Different amount
        let mut tampered = parts;
        tampered[5] = MessagePart::Uint(uint(21));
        claim!(!validator.is_signature_valid(&signature, &signer, &tampered));

        // Different signer
        claim!(!validator.is_signature_valid(&signature, OWNER, &parts));

        // Different order
        let mut reordered = parts;
        reordered.swap(0, 1);
        claim!(!validator.is_signature_valid(&signature, &signer, &reordered));
    }

    #[concordium_test]
    fn test_malformed_signature() {
        let validator = validator();
        let parts = [MessagePart::Uint(uint(7))];

        claim!(!validator.is_signature_valid("0x1234", OWNER, &parts));
        claim!(!validator.is_signature_valid("not hex", OWNER, &parts));
        claim!(!validator.is_signature_valid(&format!("0x{}", "00".repeat(65)), OWNER, &parts));
    }
}

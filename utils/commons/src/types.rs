use crate::CustomError;
use alloy_primitives::U256;
use concordium_std::{
    concordium_cfg_test, schema, schema::SchemaType, Deserial, ParseResult, Read, Serial, Write,
};
use std::fmt;

pub type AuctionResult<A> = Result<A, CustomError>;

/// Hex encoded Ethereum address. Stored addresses are lowercase, see
/// `canonical_address`.
pub type EthAddress = String;

/// Hex encoded 65 byte `r || s || v` signature.
pub type EthSignature = String;

/// Auction list identifier, assigned sequentially by the storage.
pub type ListId = u64;

/// ERC-721 token identifier.
pub type TokenId = Uint256;

/// Amount of ERC-20 base units. Minimum prices use the same unit.
pub type Erc20Amount = Uint256;

/// Unsigned 256 bit integer, as `uint256` on-chain. Serialized as 32
/// big-endian bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uint256(U256);

impl Uint256 {
    pub const ZERO: Self = Self(U256::ZERO);

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }
}

impl From<u64> for Uint256 {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<U256> for Uint256 {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serial for Uint256 {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        out.write_all(&self.to_be_bytes())
    }
}

impl Deserial for Uint256 {
    fn deserial<R: Read>(source: &mut R) -> ParseResult<Self> {
        let mut bytes = [0u8; 32];
        source.read_exact(&mut bytes)?;
        Ok(Self(U256::from_be_bytes(bytes)))
    }
}

impl SchemaType for Uint256 {
    fn get_type() -> schema::Type {
        schema::Type::ByteArray(32)
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::{claim, claim_eq, concordium_test, from_bytes, to_bytes, ExpectReport};

    #[concordium_test]
    fn test_wider_than_u64() {
        let above = Uint256::from(U256::from(100_000_000_000_000_000_000u128));
        let max = Uint256::from(u64::MAX);

        claim!(above > max);
        claim_eq!(above.to_string(), "100000000000000000000");
        claim!(!above.is_zero());
        claim!(Uint256::ZERO.is_zero());
    }

    #[concordium_test]
    fn test_serialized_big_endian() {
        let bytes = to_bytes(&Uint256::from(258u64));

        claim_eq!(bytes.len(), 32);
        claim_eq!(&bytes[30..], &[1u8, 2]);
        claim_eq!(
            from_bytes::<Uint256>(&bytes).expect_report("32 bytes"),
            Uint256::from(258u64)
        );
        claim!(from_bytes::<Uint256>(&bytes[1..]).is_err());
    }
}

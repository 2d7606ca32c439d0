use crate::Uint256;

/// One positional component of a signed message. The signed payload is the
/// packed encoding of all parts, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePart<'a> {
    /// Encoded as a 20 byte address.
    Address(&'a str),
    /// Encoded as a 32 byte big-endian `uint256`.
    Uint(Uint256),
}

/// Address, contract and signature checks the coordinator relies on.
///
/// Implementations may consult a chain node; the coordinator only needs the
/// verdicts.
pub trait HasValidator {
    /// Whether `addr` is a well-formed account or contract address.
    fn is_valid_addr(&self, addr: &str) -> bool;

    /// Whether `addr` is an ERC-721 contract.
    fn is_valid_nft_contract(&self, addr: &str) -> bool;

    /// Whether `addr` is an ERC-20 contract.
    fn is_valid_erc20_contract(&self, addr: &str) -> bool;

    /// Whether `signature` was produced by `signer` over the encoding of
    /// `parts`.
    fn is_signature_valid(&self, signature: &str, signer: &str, parts: &[MessagePart]) -> bool;
}

use concordium_std::{concordium_cfg_test, ParseError};
use std::fmt;

/// Error category, for callers that only need to branch on the kind of
/// failure (e.g. to pick a response status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidSignature,
    NotFound,
    Conflict,
    Unauthorized,
}

/// The custom errors the auction coordinator can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomError {
    /// Malformed input, tagged with the offending field (Error code: -1).
    InvalidArgument {
        field: &'static str,
        message: String,
    },
    /// Signature does not authenticate the claimed signer over the expected
    /// message (Error code: -2).
    InvalidSignature(String),
    /// Referenced list, token or bid does not exist (Error code: -3).
    NotFound(String),
    /// Creation would violate a uniqueness invariant (Error code: -4).
    Conflict(String),
    /// Owner or bidder signature rejected on a privileged action
    /// (Error code: -5).
    Unauthorized(String),
}

impl CustomError {
    pub fn invalid_argument(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            message: message.into(),
        }
    }

    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::InvalidSignature(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InvalidSignature(_) => ErrorKind::InvalidSignature,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
        }
    }

    pub fn error_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::InvalidArgument => -1,
            ErrorKind::InvalidSignature => -2,
            ErrorKind::NotFound => -3,
            ErrorKind::Conflict => -4,
            ErrorKind::Unauthorized => -5,
        }
    }

    /// Field tag of an `InvalidArgument` error.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArgument { field, .. } => Some(*field),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument { message, .. }
            | Self::InvalidSignature(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Unauthorized(message) => message,
        }
    }
}

impl fmt::Display for CustomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for CustomError {}

/// Mapping parameter parsing errors to CustomError.
impl From<ParseError> for CustomError {
    fn from(_pe: ParseError) -> Self {
        Self::invalid_argument(crate::constants::PARAMS, "failed parsing the parameter")
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::constants::ERC20_AMOUNT;
    use concordium_std::*;

    #[concordium_test]
    fn test_error_codes() {
        claim_eq!(CustomError::invalid_argument(ERC20_AMOUNT, "x").error_code(), -1);
        claim_eq!(CustomError::invalid_signature("x").error_code(), -2);
        claim_eq!(CustomError::not_found("x").error_code(), -3);
        claim_eq!(CustomError::conflict("x").error_code(), -4);
        claim_eq!(CustomError::unauthorized("x").error_code(), -5);
    }

    #[concordium_test]
    fn test_field_and_message() {
        let err = CustomError::invalid_argument(ERC20_AMOUNT, "erc20amount is less than min price");

        claim_eq!(err.kind(), ErrorKind::InvalidArgument);
        claim_eq!(err.field(), Some(ERC20_AMOUNT));
        claim_eq!(err.to_string(), "erc20amount is less than min price");

        let err = CustomError::not_found("no list with listId 7");
        claim_eq!(err.field(), None);
        claim_eq!(err.message(), "no list with listId 7");
    }

    #[concordium_test]
    fn test_parse_error_mapping() {
        let err = CustomError::from(ParseError::default());
        claim_eq!(err.kind(), ErrorKind::InvalidArgument);
        claim_eq!(err.field(), Some(crate::constants::PARAMS));
    }
}

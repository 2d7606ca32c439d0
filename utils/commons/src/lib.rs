//! It exposes the errors, types, constants and capabilities shared by the
//! auction coordinator crates.
pub use crate::{ecdsa::*, errors::*, logger::*, registry::*, types::*, validator::*};

pub mod constants;
#[cfg(any(test, feature = "test-utils"))]
pub mod test;

mod ecdsa;
mod errors;
mod logger;
mod registry;
mod types;
mod validator;

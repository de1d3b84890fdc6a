//! Types shared by the location marketplace contracts: the error taxonomy, event tags,
//! the listing fee schedule and a client for CIS-2 token registries.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{constants::*, errors::*, fee::*, registry::*, structs::*, types::*};
use concordium_cis2::*;
use concordium_std::*;

#[cfg(feature = "std")]
pub mod test;

mod constants;
mod errors;
mod fee;
mod registry;
mod structs;
mod types;

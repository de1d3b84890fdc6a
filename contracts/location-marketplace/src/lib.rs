//! Fixed-price marketplace for location deeds held in CIS-2 token registries.
//!
//! A seller escrows a deed with the marketplace and pays a listing fee proportional to the
//! asking price. Any other account may then buy the deed by paying exactly that price, which
//! moves the deed to the buyer and the price to the seller in a single transaction.
#![cfg_attr(not(feature = "std"), no_std)]

pub mod contract;
pub mod events;
pub mod external;
pub mod state;

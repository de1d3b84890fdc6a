/// Tag for the Custom Buy event.
pub const BUY_TAG: u8 = u8::MAX - 7;

/// Tag for the Custom Listing event.
pub const LISTING_TAG: u8 = u8::MAX - 8;

/// CIS-2 entrypoint moving tokens between addresses.
pub const TRANSFER_ENTRYPOINT: &str = "transfer";

/// CIS-2 entrypoint querying token balances.
pub const BALANCE_OF_ENTRYPOINT: &str = "balanceOf";

/// Receive hook invoked by a CIS-2 registry when it delivers a token to the marketplace.
pub const ON_RECEIVING_HOOK: &str = "onReceivingCIS2";

use commons::{FeeSchedule, Token};
use concordium_std::*;

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct InitParams {
    /// Account receiving every listing fee. Cannot be changed after initialization.
    pub operator: AccountAddress,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct ListingParams {
    /// Deed to put on sale. The marketplace must be an operator of the seller in its registry.
    pub token: Token,
    /// Asking price in micro CCD.
    pub price: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, SchemaType, Serialize)]
pub struct ConfigView {
    pub operator: AccountAddress,
    pub fee_schedule: FeeSchedule,
}

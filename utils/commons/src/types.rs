use super::*;

/// Contract token ID type. Location deeds are identified by arbitrary bytes in their registry.
pub type ContractTokenId = TokenIdVec;

/// Contract token amount type.
pub type ContractTokenAmount = TokenAmountU64;

/// Identifier of a market item. Allocated sequentially, never reused.
pub type ItemId = u64;

pub type TransferParameter = TransferParams<ContractTokenId, ContractTokenAmount>;

/// Parameter type for the CIS-2 function `balanceOf` specialized to the subset
/// of TokenIDs used by this contract.
pub type ContractBalanceOfQueryParams = BalanceOfQueryParams<ContractTokenId>;

/// Response type for the CIS-2 function `balanceOf` specialized to the subset
/// of TokenAmounts used by this contract.
pub type ContractBalanceOfQueryResponse = BalanceOfQueryResponse<ContractTokenAmount>;

/// Parameter of the CIS-2 receive hook for tokens delivered to a contract.
pub type ContractOnReceivingParams = OnReceivingCis2Params<ContractTokenId, ContractTokenAmount>;

use super::*;

/// The custom errors the contract can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Listing price must be above zero (Error code: -4).
    InvalidPrice,
    /// Attached amount differs from the listing fee for the price (Error code: -5).
    FeeMismatch,
    /// Attached amount differs from the item price (Error code: -6).
    AmountMismatch,
    /// Sender does not hold the token it tries to list (Error code: -7).
    NotController,
    /// No market item with this identifier (Error code: -8).
    UnknownItem,
    /// Market item was already sold (Error code: -9).
    AlreadySold,
    /// Only account addresses can list or buy tokens (Error code: -10).
    OnlyAccountAddress,
    /// This function must only be called by a contract (Error code: -11).
    ContractOnly,
    /// Token delivered without a matching listing (Error code: -12).
    UnexpectedTransfer,
    /// Arithmetic overflow (Error code: -13).
    ArithmeticOverflow,
    /// Failed to invoke a contract (Error code: -14).
    InvokeContractError,
    /// Failed to invoke a transfer (Error code: -15).
    InvokeTransferError,
    /// Incompatible contract (Error code: -16).
    Incompatible,
}

/// Mapping the logging errors to CustomContractError.
impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

/// Mapping errors related to contract invocations to CustomContractError.
impl<T> From<CallContractError<T>> for CustomContractError {
    fn from(_cce: CallContractError<T>) -> Self {
        Self::InvokeContractError
    }
}

/// Mapping errors related to transfer invocations to CustomContractError.
impl From<TransferError> for CustomContractError {
    fn from(_te: TransferError) -> Self {
        Self::InvokeTransferError
    }
}

/// Failure of a read-only query to another contract.
#[derive(Debug)]
pub enum ContractReadError<R> {
    Call(CallContractError<R>),
    Compatibility,
    Parse,
}

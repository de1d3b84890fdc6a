use commons::{
    compute_listing_fee, ContractOnReceivingParams, ContractReadError, ContractTokenAmount,
    CustomContractError, HostTokenRegistryExt, ItemId, Token, LISTING_FEE, ON_RECEIVING_HOOK,
};
use concordium_cis2::Receiver;
use concordium_std::*;

use crate::events::*;
use crate::external::*;
use crate::state::{MarketItem, State};

/// Initialize the marketplace with no listings. All listing fees go to `operator`.
#[init(contract = "LocationMarketplace", parameter = "InitParams")]
fn init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    let params =
        InitParams::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;
    Ok(State::new(state_builder, params.operator))
}

/// Listing fee for the given price.
#[receive(
    contract = "LocationMarketplace",
    name = "getListingPrice",
    parameter = "Amount",
    return_value = "Amount"
)]
fn get_listing_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    _host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Amount> {
    let price = Amount::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;
    Ok(compute_listing_fee(price)?)
}

/// Put a deed on sale. The attached amount must be exactly the listing fee for the price.
///
/// The deed is moved into escrow with the marketplace, so the marketplace has to be an operator
/// of the seller in the deed's registry. The fee is forwarded to the operator.
///
///  It rejects if:
///  - Sender is a contract.
///  - Fails to parse `ListingParams` parameters.
///  - Price is zero.
///  - Attached amount differs from the listing fee.
///  - Sender does not hold the deed.
///  - The registry refuses the escrow transfer.
#[receive(
    mutable,
    payable,
    contract = "LocationMarketplace",
    name = "createListing",
    parameter = "ListingParams",
    return_value = "u64",
    enable_logger
)]
fn create_listing<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<ItemId> {
    let seller = match ctx.sender() {
        Address::Account(addr) => addr,
        Address::Contract(_) => bail!(CustomContractError::OnlyAccountAddress.into()),
    };
    let params =
        ListingParams::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;

    let fee = host
        .state()
        .validate_listing(&params.token, params.price, amount)?;

    let is_controller = host
        .registry_is_controller(&params.token, Address::Account(seller))
        .map_err(handle_read_error)?;
    ensure!(is_controller, CustomContractError::NotController.into());

    // Record the listing before calling the registry, which calls back into `onReceivingCIS2`
    let item_id = host
        .state_mut()
        .record_listing(params.token.clone(), seller, params.price)?;

    logger
        .log(&MarketEvent::list(
            item_id,
            &params.token,
            &seller,
            params.price,
            fee,
        ))
        .map_err(CustomContractError::from)?;

    let escrow = Receiver::Contract(
        ctx.self_address(),
        OwnedEntrypointName::new_unchecked(ON_RECEIVING_HOOK.into()),
    );
    host.registry_transfer(&params.token, Address::Account(seller), escrow)
        .map_err(handle_call_error)?;

    if fee > Amount::zero() {
        let operator = host.state().operator;
        host.invoke_transfer(&operator, fee)
            .map_err(CustomContractError::from)?;
    }

    Ok(item_id)
}

/// Buy a listed deed. The attached amount must be exactly the listed price. The deed moves to
/// the buyer first, then the price is paid out to the seller.
///
///  It rejects if:
///  - Sender is a contract.
///  - Item does not exist or was already sold.
///  - Attached amount differs from the price.
///  - The registry refuses to release the deed.
#[receive(
    mutable,
    payable,
    contract = "LocationMarketplace",
    name = "purchase",
    parameter = "u64",
    enable_logger
)]
fn purchase<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let buyer = match ctx.sender() {
        Address::Account(addr) => addr,
        Address::Contract(_) => bail!(CustomContractError::OnlyAccountAddress.into()),
    };
    let item_id = ItemId::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;

    // Item is marked as sold before the registry and the seller are called
    let item = host.state_mut().settle(item_id, buyer, amount)?;

    logger
        .log(&MarketEvent::sale(
            item.item_id,
            &item.token,
            &item.seller,
            &buyer,
            item.price,
        ))
        .map_err(CustomContractError::from)?;

    host.registry_transfer(
        &item.token,
        Address::Contract(ctx.self_address()),
        Receiver::Account(buyer),
    )
    .map_err(handle_call_error)?;

    host.invoke_transfer(&item.seller, item.price)
        .map_err(CustomContractError::from)?;

    Ok(())
}

/// CIS-2 receive hook. Only accepts the single deed a seller escrows while listing it.
#[receive(
    contract = "LocationMarketplace",
    name = "onReceivingCIS2",
    parameter = "ContractOnReceivingParams"
)]
fn on_receiving_cis2<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<()> {
    let registry = match ctx.sender() {
        Address::Contract(contract) => contract,
        Address::Account(_) => bail!(CustomContractError::ContractOnly.into()),
    };
    let params = ContractOnReceivingParams::deserial(&mut ctx.parameter_cursor())
        .map_err(CustomContractError::from)?;

    let from = match params.from {
        Address::Account(addr) => addr,
        Address::Contract(_) => bail!(CustomContractError::UnexpectedTransfer.into()),
    };
    ensure_eq!(
        params.amount,
        ContractTokenAmount::from(1),
        CustomContractError::UnexpectedTransfer.into()
    );

    let token = Token {
        contract: registry,
        id: params.token_id,
    };
    let expected = host
        .state()
        .listed_item_for(&token)
        .map_or(false, |item| item.seller == from);
    ensure!(expected, CustomContractError::UnexpectedTransfer.into());

    Ok(())
}

/// Items currently on sale.
#[receive(
    contract = "LocationMarketplace",
    name = "fetchMarketItems",
    return_value = "Vec<MarketItem>"
)]
fn fetch_market_items<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Vec<MarketItem>> {
    Ok(host.state().market_items())
}

/// Items bought or listed by the given account.
#[receive(
    contract = "LocationMarketplace",
    name = "fetchMyItems",
    parameter = "AccountAddress",
    return_value = "Vec<MarketItem>"
)]
fn fetch_my_items<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Vec<MarketItem>> {
    let participant = AccountAddress::deserial(&mut ctx.parameter_cursor())
        .map_err(CustomContractError::from)?;
    Ok(host.state().items_of(&participant))
}

/// Items listed by the given account, sold or not.
#[receive(
    contract = "LocationMarketplace",
    name = "fetchItemsListed",
    parameter = "AccountAddress",
    return_value = "Vec<MarketItem>"
)]
fn fetch_items_listed<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Vec<MarketItem>> {
    let seller = AccountAddress::deserial(&mut ctx.parameter_cursor())
        .map_err(CustomContractError::from)?;
    Ok(host.state().items_listed_by(&seller))
}

#[receive(
    contract = "LocationMarketplace",
    name = "fetchMarketItem",
    parameter = "u64",
    return_value = "MarketItem"
)]
fn fetch_market_item<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<MarketItem> {
    let item_id = ItemId::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;
    Ok(host.state().item(item_id)?)
}

#[receive(
    contract = "LocationMarketplace",
    name = "viewConfig",
    return_value = "ConfigView"
)]
fn view_config<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<ConfigView> {
    Ok(ConfigView {
        operator: host.state().operator,
        fee_schedule: LISTING_FEE,
    })
}

fn handle_call_error<R>(error: CallContractError<R>) -> Reject {
    match error {
        CallContractError::LogicReject { reason, .. } => match reason {
            // concordium ParseError, the registry did not understand the request
            -2147483646 => CustomContractError::Incompatible.into(),
            _ => CustomContractError::InvokeContractError.into(),
        },
        CallContractError::MissingEntrypoint | CallContractError::MessageFailed => {
            CustomContractError::Incompatible.into()
        }
        e => e.into(),
    }
}

fn handle_read_error<R>(error: ContractReadError<R>) -> Reject {
    match error {
        ContractReadError::Call(e) => handle_call_error(e),
        ContractReadError::Compatibility | ContractReadError::Parse => {
            CustomContractError::Incompatible.into()
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::state::ItemStatus;
    use commons::test::*;
    use commons::{
        ContractBalanceOfQueryParams, TransferParameter, BALANCE_OF_ENTRYPOINT, BUY_TAG,
        LISTING_TAG, TRANSFER_ENTRYPOINT,
    };
    use concordium_cis2::{AdditionalData, BalanceOfQueryResponse, TokenIdVec};
    use concordium_std::test_infrastructure::*;

    const REGISTRY: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const MARKETPLACE: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };
    const OTHER_REGISTRY: ContractAddress = ContractAddress {
        index: 3,
        subindex: 0,
    };

    const OPERATOR: AccountAddress = AccountAddress([1; 32]);

    const USER_1: AccountAddress = AccountAddress([16; 32]);
    const USER_2: AccountAddress = AccountAddress([17; 32]);
    const USER_3: AccountAddress = AccountAddress([18; 32]);

    const PRICE: Amount = Amount::from_ccd(500);
    const FEE: Amount = Amount::from_ccd(25);

    fn deed() -> Token {
        Token {
            contract: REGISTRY,
            id: TokenIdVec(vec![0, 42]),
        }
    }

    fn default_host() -> TestHost<State<TestStateApi>> {
        let mut ctx = TestInitContext::empty();
        let params = InitParams { operator: OPERATOR };
        let bytes = to_bytes(&params);
        ctx.set_init_origin(OPERATOR).set_parameter(&bytes);
        let mut state_builder = TestStateBuilder::new();

        // Call the init method.
        let state = init(&ctx, &mut state_builder)
            .expect_report("Failed during init_LocationMarketplace");

        TestHost::new(state, state_builder)
    }

    fn receive_ctx(sender: Address, parameter: &[u8]) -> TestReceiveContext<'_> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(sender)
            .set_self_address(MARKETPLACE)
            .set_parameter(parameter);
        if let Address::Account(account) = sender {
            ctx.set_invoker(account);
        }
        ctx
    }

    /// Registry in which the queried address holds `balance` of the deed and every transfer
    /// succeeds.
    fn setup_registry(host: &mut TestHost<State<TestStateApi>>, balance: u64) {
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(BALANCE_OF_ENTRYPOINT.into()),
            parse_and_ok_mock::<ContractBalanceOfQueryParams, _>(BalanceOfQueryResponse(vec![
                ContractTokenAmount::from(balance),
            ])),
        );
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(TRANSFER_ENTRYPOINT.into()),
            parse_and_ok_mock::<TransferParameter, _>(()),
        );
    }

    fn list(
        host: &mut TestHost<State<TestStateApi>>,
        seller: Address,
        price: Amount,
        fee: Amount,
        logger: &mut TestLogger,
    ) -> ReceiveResult<ItemId> {
        let params = ListingParams {
            token: deed(),
            price,
        };
        let bytes = to_bytes(&params);
        let ctx = receive_ctx(seller, &bytes);
        host.set_self_balance(fee);
        create_listing(&ctx, host, fee, logger)
    }

    fn buy(
        host: &mut TestHost<State<TestStateApi>>,
        buyer: Address,
        item_id: ItemId,
        amount: Amount,
        logger: &mut TestLogger,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(&item_id);
        let ctx = receive_ctx(buyer, &bytes);
        host.set_self_balance(amount);
        purchase(&ctx, host, amount, logger)
    }

    fn market_items(host: &TestHost<State<TestStateApi>>) -> Vec<MarketItem> {
        let ctx = receive_ctx(Address::Account(USER_3), &[]);
        fetch_market_items(&ctx, host).expect_report("Failed to fetch market items")
    }

    fn my_items(host: &TestHost<State<TestStateApi>>, participant: AccountAddress) -> Vec<MarketItem> {
        let bytes = to_bytes(&participant);
        let ctx = receive_ctx(Address::Account(participant), &bytes);
        fetch_my_items(&ctx, host).expect_report("Failed to fetch own items")
    }

    fn listed_host() -> TestHost<State<TestStateApi>> {
        let mut host = default_host();
        setup_registry(&mut host, 1);
        let mut logger = TestLogger::init();
        let result = list(&mut host, Address::Account(USER_1), PRICE, FEE, &mut logger);
        claim_eq!(result, Ok(0));
        host
    }

    #[concordium_test]
    fn test_init() {
        let host = default_host();
        let state = host.state();

        claim_eq!(state.operator, OPERATOR);
        claim_eq!(state.next_item_id, 0);

        let ctx = receive_ctx(Address::Account(USER_1), &[]);
        let config = view_config(&ctx, &host);
        claim_eq!(
            config,
            Ok(ConfigView {
                operator: OPERATOR,
                fee_schedule: LISTING_FEE,
            })
        );
        claim_eq!(market_items(&host), Vec::new());
    }

    #[concordium_test]
    fn test_get_listing_price() {
        let host = default_host();

        for (price, fee) in [
            (Amount::from_ccd(500), Amount::from_ccd(25)),
            (Amount::from_ccd(600), Amount::from_ccd(30)),
            (Amount::from_micro_ccd(39), Amount::from_micro_ccd(1)),
        ] {
            let bytes = to_bytes(&price);
            let ctx = receive_ctx(Address::Account(USER_1), &bytes);
            claim_eq!(get_listing_price(&ctx, &host), Ok(fee));
        }

        let bytes = to_bytes(&Amount::from_micro_ccd(u64::MAX));
        let ctx = receive_ctx(Address::Account(USER_1), &bytes);
        claim_eq!(
            get_listing_price(&ctx, &host),
            Err(CustomContractError::ArithmeticOverflow.into())
        );
    }

    #[concordium_test]
    fn test_create_listing() {
        let mut host = default_host();
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(BALANCE_OF_ENTRYPOINT.into()),
            parse_and_check_mock::<ContractBalanceOfQueryParams, _>(
                |params| {
                    params.queries.len() == 1
                        && params.queries[0].token_id == deed().id
                        && params.queries[0].address == Address::Account(USER_1)
                },
                BalanceOfQueryResponse(vec![ContractTokenAmount::from(1)]),
            ),
        );
        // Escrow transfer, the item has to be recorded by the time the hook is called
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(TRANSFER_ENTRYPOINT.into()),
            MockFn::new_v1(|parameter, _amount, _balance, state: &mut State<TestStateApi>| {
                let params = TransferParameter::deserial(&mut Cursor::new(parameter.as_ref()))
                    .map_err(|_| CallContractError::Trap)?;
                let into_escrow = params.0.len() == 1
                    && params.0[0].from == Address::Account(USER_1)
                    && matches!(params.0[0].to, Receiver::Contract(MARKETPLACE, _));
                let recorded = state.listed_item_for(&deed()).is_some();
                if into_escrow && recorded {
                    Ok((false, ()))
                } else {
                    Err(CallContractError::Trap)
                }
            }),
        );
        let mut logger = TestLogger::init();

        let result = list(&mut host, Address::Account(USER_1), PRICE, FEE, &mut logger);

        claim_eq!(result, Ok(0));
        // Listing fee goes to the operator
        claim!(host.transfer_occurred(&OPERATOR, FEE));
        claim_eq!(host.get_transfers().len(), 1);

        let item = MarketItem {
            item_id: 0,
            token: deed(),
            seller: USER_1,
            price: PRICE,
            status: ItemStatus::Listed,
        };
        claim_eq!(market_items(&host), vec![item.clone()]);
        claim_eq!(my_items(&host, USER_1), vec![item]);
        claim_eq!(my_items(&host, USER_2), Vec::new());

        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], LISTING_TAG);
        claim_eq!(
            logger.logs[0],
            to_bytes(&MarketEvent::list(0, &deed(), &USER_1, PRICE, FEE))
        );
    }

    #[concordium_test]
    fn test_create_listing_fee_mismatch() {
        let mut host = default_host();
        setup_registry(&mut host, 1);
        let mut logger = TestLogger::init();

        for fee in [
            Amount::zero(),
            Amount::from_ccd(24),
            Amount::from_micro_ccd(25_000_001),
            Amount::from_ccd(500),
        ] {
            let result = list(&mut host, Address::Account(USER_1), PRICE, fee, &mut logger);
            claim_eq!(result, Err(CustomContractError::FeeMismatch.into()));
        }

        claim!(host.get_transfers().is_empty());
        claim!(logger.logs.is_empty());
        claim_eq!(host.state().next_item_id, 0);
    }

    #[concordium_test]
    fn test_create_listing_zero_price() {
        let mut host = default_host();
        setup_registry(&mut host, 1);
        let mut logger = TestLogger::init();

        let result = list(
            &mut host,
            Address::Account(USER_1),
            Amount::zero(),
            Amount::zero(),
            &mut logger,
        );

        claim_eq!(result, Err(CustomContractError::InvalidPrice.into()));
        claim_eq!(market_items(&host), Vec::new());
    }

    #[concordium_test]
    fn test_create_listing_not_controller() {
        let mut host = default_host();
        setup_registry(&mut host, 0);
        let mut logger = TestLogger::init();

        let result = list(&mut host, Address::Account(USER_2), PRICE, FEE, &mut logger);

        claim_eq!(result, Err(CustomContractError::NotController.into()));
        claim!(host.get_transfers().is_empty());
        claim_eq!(host.state().next_item_id, 0);
    }

    #[concordium_test]
    fn test_create_listing_without_fee() {
        let mut host = default_host();
        setup_registry(&mut host, 1);
        let mut logger = TestLogger::init();

        // 5% of 19 micro CCD rounds down to nothing
        let price = Amount::from_micro_ccd(19);
        let result = list(&mut host, Address::Account(USER_1), price, Amount::zero(), &mut logger);

        claim_eq!(result, Ok(0));
        claim!(host.get_transfers().is_empty());
        claim_eq!(market_items(&host).len(), 1);
        claim_eq!(
            logger.logs[0],
            to_bytes(&MarketEvent::list(0, &deed(), &USER_1, price, Amount::zero()))
        );
    }

    #[concordium_test]
    fn test_create_listing_from_contract() {
        let mut host = default_host();
        setup_registry(&mut host, 1);
        let mut logger = TestLogger::init();

        let result = list(&mut host, Address::Contract(OTHER_REGISTRY), PRICE, FEE, &mut logger);

        claim_eq!(result, Err(CustomContractError::OnlyAccountAddress.into()));
    }

    #[concordium_test]
    fn test_create_listing_twice() {
        let mut host = listed_host();
        let mut logger = TestLogger::init();

        // The registry still reports a balance, but the deed is already in escrow
        let result = list(&mut host, Address::Account(USER_1), PRICE, FEE, &mut logger);

        claim_eq!(result, Err(CustomContractError::NotController.into()));
        claim_eq!(host.state().next_item_id, 1);
    }

    #[concordium_test]
    fn test_create_listing_registry_failures() {
        let mut host = default_host();
        let mut logger = TestLogger::init();

        // Registry answers with more balances than queried
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(BALANCE_OF_ENTRYPOINT.into()),
            parse_and_ok_mock::<ContractBalanceOfQueryParams, _>(BalanceOfQueryResponse(vec![
                ContractTokenAmount::from(1),
                ContractTokenAmount::from(1),
            ])),
        );
        let result = list(&mut host, Address::Account(USER_1), PRICE, FEE, &mut logger);
        claim_eq!(result, Err(CustomContractError::Incompatible.into()));

        // Marketplace is not an operator of the seller
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(BALANCE_OF_ENTRYPOINT.into()),
            parse_and_ok_mock::<ContractBalanceOfQueryParams, _>(BalanceOfQueryResponse(vec![
                ContractTokenAmount::from(1),
            ])),
        );
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(TRANSFER_ENTRYPOINT.into()),
            reject_mock(),
        );
        let result = list(&mut host, Address::Account(USER_1), PRICE, FEE, &mut logger);
        claim_eq!(result, Err(Reject::from(CallContractError::<()>::Trap)));

        // No CCD leaves the contract
        claim!(host.get_transfers().is_empty());
    }

    #[concordium_test]
    fn test_purchase() {
        let mut host = listed_host();
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(TRANSFER_ENTRYPOINT.into()),
            parse_and_check_mock::<TransferParameter, _>(
                |params| {
                    params.0.len() == 1
                        && params.0[0].token_id == deed().id
                        && params.0[0].from == Address::Contract(MARKETPLACE)
                        && matches!(params.0[0].to, Receiver::Account(USER_2))
                },
                (),
            ),
        );
        let mut logger = TestLogger::init();

        let result = buy(&mut host, Address::Account(USER_2), 0, PRICE, &mut logger);

        claim_eq!(result, Ok(()));
        // Sale proceeds go to the seller
        claim!(host.transfer_occurred(&USER_1, PRICE));

        let item = MarketItem {
            item_id: 0,
            token: deed(),
            seller: USER_1,
            price: PRICE,
            status: ItemStatus::Sold(USER_2),
        };
        claim_eq!(market_items(&host), Vec::new());
        claim_eq!(my_items(&host, USER_2), vec![item.clone()]);
        // Sold items stay visible to their seller
        claim_eq!(my_items(&host, USER_1), vec![item]);

        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], BUY_TAG);
        claim_eq!(
            logger.logs[0],
            to_bytes(&MarketEvent::sale(0, &deed(), &USER_1, &USER_2, PRICE))
        );
    }

    #[concordium_test]
    fn test_purchase_amount_mismatch() {
        let mut host = listed_host();
        let mut logger = TestLogger::init();

        for amount in [
            Amount::zero(),
            Amount::from_micro_ccd(499_999_999),
            Amount::from_micro_ccd(500_000_001),
        ] {
            let result = buy(&mut host, Address::Account(USER_2), 0, amount, &mut logger);
            claim_eq!(result, Err(CustomContractError::AmountMismatch.into()));
        }

        claim_eq!(market_items(&host).len(), 1);
        claim!(logger.logs.is_empty());
    }

    #[concordium_test]
    fn test_purchase_twice() {
        let mut host = listed_host();
        let mut logger = TestLogger::init();

        let result = buy(&mut host, Address::Account(USER_2), 0, PRICE, &mut logger);
        claim_eq!(result, Ok(()));

        let result = buy(&mut host, Address::Account(USER_3), 0, PRICE, &mut logger);
        claim_eq!(result, Err(CustomContractError::AlreadySold.into()));

        // The seller was paid once
        claim_eq!(
            host.get_transfers()
                .iter()
                .filter(|(receiver, _)| *receiver == USER_1)
                .count(),
            1
        );
        claim_eq!(my_items(&host, USER_3), Vec::new());
    }

    #[concordium_test]
    fn test_purchase_unknown_item() {
        let mut host = listed_host();
        let mut logger = TestLogger::init();

        let result = buy(&mut host, Address::Account(USER_2), 1, PRICE, &mut logger);

        claim_eq!(result, Err(CustomContractError::UnknownItem.into()));
    }

    #[concordium_test]
    fn test_purchase_from_contract() {
        let mut host = listed_host();
        let mut logger = TestLogger::init();

        let result = buy(&mut host, Address::Contract(OTHER_REGISTRY), 0, PRICE, &mut logger);

        claim_eq!(result, Err(CustomContractError::OnlyAccountAddress.into()));
    }

    #[concordium_test]
    fn test_purchase_registry_observes_sale() {
        let mut host = listed_host();
        // Registry callback sees the item already sold to the buyer
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(TRANSFER_ENTRYPOINT.into()),
            MockFn::new_v1(|_parameter, _amount, _balance, state: &mut State<TestStateApi>| {
                match state.item(0) {
                    Ok(item) if item.owner() == Some(USER_2) => Ok((false, ())),
                    _ => Err(CallContractError::Trap),
                }
            }),
        );
        let mut logger = TestLogger::init();

        let result = buy(&mut host, Address::Account(USER_2), 0, PRICE, &mut logger);

        claim_eq!(result, Ok(()));
    }

    #[concordium_test]
    fn test_purchase_registry_rejects() {
        let mut host = listed_host();
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(TRANSFER_ENTRYPOINT.into()),
            reject_mock(),
        );
        let mut logger = TestLogger::init();

        let result = buy(&mut host, Address::Account(USER_2), 0, PRICE, &mut logger);

        claim_eq!(result, Err(Reject::from(CallContractError::<()>::Trap)));
        // Seller is never paid without the deed moving
        claim!(!host.transfer_occurred(&USER_1, PRICE));
    }

    #[concordium_test]
    fn test_resale() {
        let mut host = listed_host();
        let mut logger = TestLogger::init();

        claim_eq!(
            buy(&mut host, Address::Account(USER_2), 0, PRICE, &mut logger),
            Ok(())
        );
        claim!(host.transfer_occurred(&USER_1, PRICE));

        // Buyer lists the deed again at a higher price
        let price = Amount::from_ccd(600);
        let fee = Amount::from_ccd(30);
        let result = list(&mut host, Address::Account(USER_2), price, fee, &mut logger);

        claim_eq!(result, Ok(1));
        claim!(host.transfer_occurred(&OPERATOR, fee));

        let market = market_items(&host);
        claim_eq!(market.len(), 1);
        claim_eq!(market[0].item_id, 1);
        claim_eq!(market[0].seller, USER_2);
        claim_eq!(market[0].price, price);

        let bytes = to_bytes(&USER_2);
        let ctx = receive_ctx(Address::Account(USER_3), &bytes);
        let listed = fetch_items_listed(&ctx, &host).expect_report("Failed to fetch listings");
        claim_eq!(listed, vec![market[0].clone()]);
        // Bought item and own listing
        claim_eq!(my_items(&host, USER_2).len(), 2);

        let bytes = to_bytes(&0u64);
        let ctx = receive_ctx(Address::Account(USER_3), &bytes);
        let first = fetch_market_item(&ctx, &host).expect_report("Failed to fetch item");
        claim_eq!(first.status, ItemStatus::Sold(USER_2));

        claim_eq!(
            buy(&mut host, Address::Account(USER_3), 1, price, &mut logger),
            Ok(())
        );
        claim!(host.transfer_occurred(&USER_2, price));
        claim_eq!(market_items(&host), Vec::new());
    }

    #[concordium_test]
    fn test_fetch_is_stable() {
        let mut host = listed_host();
        let mut logger = TestLogger::init();
        let other = Token {
            contract: REGISTRY,
            id: TokenIdVec(vec![1]),
        };
        let params = ListingParams {
            token: other,
            price: Amount::from_ccd(20),
        };
        let bytes = to_bytes(&params);
        let ctx = receive_ctx(Address::Account(USER_2), &bytes);
        host.set_self_balance(Amount::from_ccd(1));
        claim_eq!(
            create_listing(&ctx, &mut host, Amount::from_ccd(1), &mut logger),
            Ok(1)
        );

        let first = market_items(&host);
        let second = market_items(&host);

        claim_eq!(first.len(), 2);
        claim_eq!(first, second);
        claim_eq!(first[0].item_id, 0);
        claim_eq!(first[1].item_id, 1);
    }

    #[concordium_test]
    fn test_fetch_unknown_item() {
        let host = default_host();
        let bytes = to_bytes(&5u64);
        let ctx = receive_ctx(Address::Account(USER_1), &bytes);

        claim_eq!(
            fetch_market_item(&ctx, &host),
            Err(CustomContractError::UnknownItem.into())
        );
    }

    fn hook_params(from: Address, amount: u64) -> ContractOnReceivingParams {
        ContractOnReceivingParams {
            token_id: deed().id,
            amount: ContractTokenAmount::from(amount),
            from,
            data: AdditionalData::empty(),
        }
    }

    #[concordium_test]
    fn test_on_receiving_listed_deed() {
        let host = listed_host();
        let bytes = to_bytes(&hook_params(Address::Account(USER_1), 1));
        let ctx = receive_ctx(Address::Contract(REGISTRY), &bytes);

        claim_eq!(on_receiving_cis2(&ctx, &host), Ok(()));
    }

    #[concordium_test]
    fn test_on_receiving_unexpected() {
        let host = listed_host();

        let cases = [
            // Not the seller of the listing
            (Address::Contract(REGISTRY), hook_params(Address::Account(USER_2), 1)),
            // More than the single deed
            (Address::Contract(REGISTRY), hook_params(Address::Account(USER_1), 2)),
            // Same token id in another registry
            (Address::Contract(OTHER_REGISTRY), hook_params(Address::Account(USER_1), 1)),
            (Address::Contract(REGISTRY), hook_params(Address::Contract(OTHER_REGISTRY), 1)),
        ];
        for (sender, params) in cases.iter() {
            let bytes = to_bytes(params);
            let ctx = receive_ctx(*sender, &bytes);
            claim_eq!(
                on_receiving_cis2(&ctx, &host),
                Err(CustomContractError::UnexpectedTransfer.into())
            );
        }

        let bytes = to_bytes(&hook_params(Address::Account(USER_1), 1));
        let ctx = receive_ctx(Address::Account(USER_1), &bytes);
        claim_eq!(
            on_receiving_cis2(&ctx, &host),
            Err(CustomContractError::ContractOnly.into())
        );
    }

    #[concordium_test]
    fn test_on_receiving_after_sale() {
        let mut host = listed_host();
        let mut logger = TestLogger::init();
        claim_eq!(
            buy(&mut host, Address::Account(USER_2), 0, PRICE, &mut logger),
            Ok(())
        );

        let bytes = to_bytes(&hook_params(Address::Account(USER_1), 1));
        let ctx = receive_ctx(Address::Contract(REGISTRY), &bytes);

        claim_eq!(
            on_receiving_cis2(&ctx, &host),
            Err(CustomContractError::UnexpectedTransfer.into())
        );
    }
}

use super::*;

/// Calls into the CIS-2 registry that owns a [`Token`].
pub trait HostTokenRegistryExt<S>: HasHost<S> {
    /// Amount of `token` held by `owner` according to its registry.
    fn registry_balance_of(
        &self,
        token: &Token,
        owner: Address,
    ) -> Result<ContractTokenAmount, ContractReadError<Self::ReturnValueType>> {
        let params = ContractBalanceOfQueryParams {
            queries: vec![BalanceOfQuery {
                token_id: token.id.clone(),
                address: owner,
            }],
        };

        let mut response = self
            .invoke_contract_read_only(
                &token.contract,
                &params,
                EntrypointName::new_unchecked(BALANCE_OF_ENTRYPOINT),
                Amount::zero(),
            )
            .map_err(ContractReadError::Call)?
            .ok_or(ContractReadError::Compatibility)?;

        let balances = ContractBalanceOfQueryResponse::deserial(&mut response)
            .map_err(|_| ContractReadError::Parse)?;

        // One query was sent, so exactly one balance must come back
        match balances.0.as_slice() {
            [balance] => Ok(*balance),
            _ => Err(ContractReadError::Compatibility),
        }
    }

    /// Whether `participant` currently controls the (non-fungible) `token`.
    fn registry_is_controller(
        &self,
        token: &Token,
        participant: Address,
    ) -> Result<bool, ContractReadError<Self::ReturnValueType>> {
        let balance = self.registry_balance_of(token, participant)?;
        Ok(balance == ContractTokenAmount::from(1))
    }

    /// Move custody of a single `token` from `from` to `to`. The registry rejects the call
    /// unless the calling contract is `from` or one of its operators.
    fn registry_transfer(
        &mut self,
        token: &Token,
        from: Address,
        to: Receiver,
    ) -> Result<(), CallContractError<Self::ReturnValueType>> {
        let params: TransferParameter = TransferParams(vec![Transfer {
            token_id: token.id.clone(),
            amount: ContractTokenAmount::from(1),
            from,
            to,
            data: AdditionalData::empty(),
        }]);

        self.invoke_contract(
            &token.contract,
            &params,
            EntrypointName::new_unchecked(TRANSFER_ENTRYPOINT),
            Amount::zero(),
        )?;

        Ok(())
    }
}

impl<S, H: HasHost<S>> HostTokenRegistryExt<S> for H {}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::test::*;
    use concordium_std::test_infrastructure::*;

    const REGISTRY: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const MARKETPLACE: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };

    const USER_1: AccountAddress = AccountAddress([16; 32]);
    const USER_2: AccountAddress = AccountAddress([17; 32]);

    fn deed() -> Token {
        Token {
            contract: REGISTRY,
            id: TokenIdVec(vec![7, 7]),
        }
    }

    /// Stand-in for the state of a contract calling the registry.
    #[derive(Serial, DeserialWithState, StateClone)]
    #[concordium(state_parameter = "S")]
    struct TestState<S: HasStateApi> {
        escrowed: StateSet<Token, S>,
    }

    fn default_host() -> TestHost<TestState<TestStateApi>> {
        let mut state_builder = TestStateBuilder::new();
        let state = TestState {
            escrowed: state_builder.new_set(),
        };
        TestHost::new(state, state_builder)
    }

    #[concordium_test]
    fn test_balance_of() {
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

        let result = host.registry_balance_of(&deed(), Address::Account(USER_1));
        claim!(matches!(result, Ok(balance) if balance == ContractTokenAmount::from(1)));

        let result = host.registry_is_controller(&deed(), Address::Account(USER_1));
        claim!(matches!(result, Ok(true)));
    }

    #[concordium_test]
    fn test_not_controller() {
        let mut host = default_host();

        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(BALANCE_OF_ENTRYPOINT.into()),
            parse_and_ok_mock::<ContractBalanceOfQueryParams, _>(BalanceOfQueryResponse(vec![
                ContractTokenAmount::from(0),
            ])),
        );

        let result = host.registry_is_controller(&deed(), Address::Account(USER_2));
        claim!(matches!(result, Ok(false)));
    }

    #[concordium_test]
    fn test_balance_of_wrong_reply() {
        let mut host = default_host();

        // Registry answers with two balances for a single query
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(BALANCE_OF_ENTRYPOINT.into()),
            parse_and_ok_mock::<ContractBalanceOfQueryParams, _>(BalanceOfQueryResponse(vec![
                ContractTokenAmount::from(1),
                ContractTokenAmount::from(1),
            ])),
        );

        let result = host.registry_balance_of(&deed(), Address::Account(USER_1));
        claim!(matches!(result, Err(ContractReadError::Compatibility)));
    }

    #[concordium_test]
    fn test_balance_of_rejected() {
        let mut host = default_host();

        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(BALANCE_OF_ENTRYPOINT.into()),
            reject_mock(),
        );

        let result = host.registry_balance_of(&deed(), Address::Account(USER_1));
        claim!(matches!(result, Err(ContractReadError::Call(_))));
    }

    #[concordium_test]
    fn test_transfer_into_escrow() {
        let mut host = default_host();

        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(TRANSFER_ENTRYPOINT.into()),
            parse_and_check_mock::<TransferParameter, _>(
                |params| {
                    params.0.len() == 1
                        && params.0[0].token_id == deed().id
                        && params.0[0].amount == ContractTokenAmount::from(1)
                        && params.0[0].from == Address::Account(USER_1)
                        && matches!(
                            &params.0[0].to,
                            Receiver::Contract(contract, hook)
                                if *contract == MARKETPLACE
                                    && *hook == OwnedEntrypointName::new_unchecked(ON_RECEIVING_HOOK.into())
                        )
                },
                (),
            ),
        );

        let result = host.registry_transfer(
            &deed(),
            Address::Account(USER_1),
            Receiver::Contract(
                MARKETPLACE,
                OwnedEntrypointName::new_unchecked(ON_RECEIVING_HOOK.into()),
            ),
        );
        claim!(result.is_ok());

        // Caller state stays usable after the call
        host.state_mut().escrowed.insert(deed());
        claim!(host.state().escrowed.contains(&deed()));
    }

    #[concordium_test]
    fn test_transfer_rejected() {
        let mut host = default_host();

        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(TRANSFER_ENTRYPOINT.into()),
            reject_mock(),
        );

        let result = host.registry_transfer(
            &deed(),
            Address::Contract(MARKETPLACE),
            Receiver::Account(USER_2),
        );
        claim!(result.is_err());
    }
}

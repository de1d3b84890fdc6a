//! Mock registry entrypoints for `TestHost`. Compiled with the `std` feature so that
//! contracts depending on this crate can use them in their own tests.

use concordium_std::test_infrastructure::MockFn;
use concordium_std::*;

/// Registry endpoint that answers any well formed `D` with `return_value`.
pub fn parse_and_ok_mock<D: Deserial, S>(
    return_value: impl Clone + Serial + 'static,
) -> MockFn<S> {
    parse_and_check_mock::<D, S>(|_| true, return_value)
}

/// Registry endpoint that traps unless the parameter parses as `D` and satisfies `check`.
pub fn parse_and_check_mock<D: Deserial, S>(
    check: impl Fn(&D) -> bool + 'static,
    return_value: impl Clone + Serial + 'static,
) -> MockFn<S> {
    MockFn::new(move |parameter, _amount, _balance, _state| {
        match D::deserial(&mut Cursor::new(parameter)) {
            Ok(request) if check(&request) => Ok((false, Some(return_value.clone()))),
            _ => Err(CallContractError::Trap),
        }
    })
}

/// Registry endpoint that refuses every call.
pub fn reject_mock<S>() -> MockFn<S> {
    MockFn::new(|_, _, _, _state| Err::<(bool, Option<()>), _>(CallContractError::Trap))
}

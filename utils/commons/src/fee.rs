use super::*;

/// Listing fee charged by the marketplace: 5% of the listed price.
pub const LISTING_FEE: FeeSchedule = FeeSchedule {
    numerator: 5,
    denominator: 100,
};

/// Fixed fraction of a price, applied to micro CCD with floor division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct FeeSchedule {
    pub numerator: u64,
    pub denominator: u64,
}

impl FeeSchedule {
    /// Fee owed for `price`. Fails instead of wrapping when `price * numerator` does not fit.
    pub fn fee_for(&self, price: Amount) -> Result<Amount, CustomContractError> {
        price
            .micro_ccd
            .checked_mul(self.numerator)
            .and_then(|scaled| scaled.checked_div(self.denominator))
            .map(Amount::from_micro_ccd)
            .ok_or(CustomContractError::ArithmeticOverflow)
    }
}

/// Fee a seller has to attach when listing a token at `price`.
pub fn compute_listing_fee(price: Amount) -> Result<Amount, CustomContractError> {
    LISTING_FEE.fee_for(price)
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    #[concordium_test]
    fn test_listing_fee() {
        claim_eq!(
            compute_listing_fee(Amount::from_ccd(500)),
            Ok(Amount::from_ccd(25))
        );
        claim_eq!(
            compute_listing_fee(Amount::from_ccd(600)),
            Ok(Amount::from_ccd(30))
        );
        claim_eq!(
            compute_listing_fee(Amount::from_micro_ccd(1)),
            Ok(Amount::zero())
        );
    }

    #[concordium_test]
    fn test_listing_fee_rounds_down() {
        // 5% of 39 micro CCD is 1.95
        claim_eq!(
            compute_listing_fee(Amount::from_micro_ccd(39)),
            Ok(Amount::from_micro_ccd(1))
        );
        claim_eq!(
            compute_listing_fee(Amount::from_micro_ccd(40)),
            Ok(Amount::from_micro_ccd(2))
        );

        for micro_ccd in [1u64, 19, 20, 21, 999, 1_000_001, 123_456_789] {
            claim_eq!(
                compute_listing_fee(Amount::from_micro_ccd(micro_ccd)),
                Ok(Amount::from_micro_ccd(micro_ccd * 5 / 100))
            );
        }
    }

    #[concordium_test]
    fn test_listing_fee_overflow() {
        claim_eq!(
            compute_listing_fee(Amount::from_micro_ccd(u64::MAX)),
            Err(CustomContractError::ArithmeticOverflow)
        );
        claim_eq!(
            compute_listing_fee(Amount::from_micro_ccd(u64::MAX / 5)),
            Ok(Amount::from_micro_ccd(u64::MAX / 5 * 5 / 100))
        );
    }

    #[concordium_test]
    fn test_custom_schedule() {
        let schedule = FeeSchedule {
            numerator: 1,
            denominator: 3,
        };
        claim_eq!(
            schedule.fee_for(Amount::from_micro_ccd(10)),
            Ok(Amount::from_micro_ccd(3))
        );

        let broken = FeeSchedule {
            numerator: 1,
            denominator: 0,
        };
        claim_eq!(
            broken.fee_for(Amount::from_micro_ccd(10)),
            Err(CustomContractError::ArithmeticOverflow)
        );
    }
}

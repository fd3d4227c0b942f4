use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of a hypothetical round trip trade.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct ProfitCalculation {
    pub gross_profit: Decimal,
    /// Fees on both legs, `fee_percent` of each leg's notional.
    pub fees: Decimal,
    pub net_profit: Decimal,
    /// Net profit relative to the entry notional, zero when the entry notional is zero.
    pub roi_percent: Decimal,
}

impl ProfitCalculation {
    /// Returns `None` if any intermediate figure overflows.
    pub fn compute(
        entry_price: Decimal,
        exit_price: Decimal,
        amount: Decimal,
        fee_percent: Decimal,
    ) -> Option<Self> {
        let entry_notional = entry_price.checked_mul(amount)?;
        let exit_notional = exit_price.checked_mul(amount)?;

        let gross_profit = exit_notional.checked_sub(entry_notional)?;
        let fees = entry_notional
            .checked_add(exit_notional)?
            .checked_mul(fee_percent)?
            .checked_div(Decimal::ONE_HUNDRED)?;
        let net_profit = gross_profit.checked_sub(fees)?;

        let roi_percent = if entry_notional.is_zero() {
            Decimal::ZERO
        } else {
            net_profit
                .checked_div(entry_notional)?
                .checked_mul(Decimal::ONE_HUNDRED)?
        };

        Some(Self {
            gross_profit,
            fees,
            net_profit,
            roi_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_profit_calculation_compute() {
        struct TestCase {
            entry: Decimal,
            exit: Decimal,
            amount: Decimal,
            fee_percent: Decimal,
            expected: Option<ProfitCalculation>,
        }

        let tests = vec![
            TestCase {
                // TC0: profitable trade without fees
                entry: dec!(100),
                exit: dec!(150),
                amount: dec!(2),
                fee_percent: dec!(0),
                expected: Some(ProfitCalculation {
                    gross_profit: dec!(100),
                    fees: dec!(0),
                    net_profit: dec!(100),
                    roi_percent: dec!(50),
                }),
            },
            TestCase {
                // TC1: fees charged on both legs
                entry: dec!(100),
                exit: dec!(110),
                amount: dec!(10),
                fee_percent: dec!(0.1),
                expected: Some(ProfitCalculation {
                    gross_profit: dec!(100),
                    fees: dec!(2.1),
                    net_profit: dec!(97.9),
                    roi_percent: dec!(9.79),
                }),
            },
            TestCase {
                // TC2: losing trade
                entry: dec!(200),
                exit: dec!(150),
                amount: dec!(1),
                fee_percent: dec!(0),
                expected: Some(ProfitCalculation {
                    gross_profit: dec!(-50),
                    fees: dec!(0),
                    net_profit: dec!(-50),
                    roi_percent: dec!(-25),
                }),
            },
            TestCase {
                // TC3: zero entry notional has zero roi
                entry: dec!(0),
                exit: dec!(10),
                amount: dec!(1),
                fee_percent: dec!(0),
                expected: Some(ProfitCalculation {
                    gross_profit: dec!(10),
                    fees: dec!(0),
                    net_profit: dec!(10),
                    roi_percent: dec!(0),
                }),
            },
            TestCase {
                // TC4: notional out of range
                entry: Decimal::MAX,
                exit: Decimal::MAX,
                amount: dec!(2),
                fee_percent: dec!(0),
                expected: None,
            },
            TestCase {
                // TC5: fee base out of range
                entry: Decimal::MAX,
                exit: Decimal::MAX,
                amount: dec!(1),
                fee_percent: dec!(0.1),
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = ProfitCalculation::compute(test.entry, test.exit, test.amount, test.fee_percent);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }
}

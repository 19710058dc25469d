use rust_decimal::RoundingStrategy;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::LoanSimError;
use crate::types::{Money, Rate};
use crate::LoanSimResult;

/// Largest number of decimals a currency unit may be rounded to.
pub const MAX_CURRENCY_DECIMALS: u32 = 8;

/// Compound factor (1 + r)^n for an integer number of periods.
pub fn compound_factor(rate: Rate, nper: u32) -> LoanSimResult<Decimal> {
    if rate <= dec!(-1) {
        return Err(LoanSimError::invalid(
            "rate",
            "Periodic rate must be greater than -100%",
        ));
    }

    (Decimal::ONE + rate)
        .checked_powu(u64::from(nper))
        .ok_or_else(|| {
            LoanSimError::NumericOverflow(format!(
                "(1 + {rate})^{nper} exceeds decimal range"
            ))
        })
}

/// Future value of one unit paid every period: ((1 + r)^n - 1) / r, or n at
/// a zero rate. Bounds how far per-period rounding errors can compound.
pub fn accumulation_factor(rate: Rate, nper: u32) -> LoanSimResult<Decimal> {
    if rate.is_zero() {
        return Ok(Decimal::from(nper));
    }
    (compound_factor(rate, nper)? - Decimal::ONE)
        .checked_div(rate)
        .ok_or_else(|| LoanSimError::overflow("accumulation factor"))
}

/// Round to the smallest currency unit with banker's rounding (half to even).
pub fn round_to_unit(amount: Money, currency_decimals: u32) -> Money {
    amount.round_dp_with_strategy(currency_decimals, RoundingStrategy::MidpointNearestEven)
}

/// One unit of the currency at the given precision (1, 0.01, ...).
pub fn currency_unit(currency_decimals: u32) -> Money {
    Decimal::new(1, currency_decimals.min(MAX_CURRENCY_DECIMALS))
}

/// Monthly rate from a nominal annual percentage (12.0 -> 0.01).
pub fn monthly_from_nominal_annual_pct(annual_pct: Decimal) -> Rate {
    annual_pct / dec!(12) / dec!(100)
}

/// Effective annual rate implied by a monthly rate: (1 + r)^12 - 1.
pub fn effective_annual_rate(monthly_rate: Rate) -> LoanSimResult<Rate> {
    Ok(compound_factor(monthly_rate, 12)? - Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_compound_factor_zero_rate() {
        assert_eq!(compound_factor(dec!(0), 240).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_compound_factor_one_percent() {
        let f = compound_factor(dec!(0.01), 240).unwrap();
        // 1.01^240 ~ 10.8925536539
        assert!((f - dec!(10.8925536539)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_compound_factor_overflow() {
        let err = compound_factor(dec!(50), 600).unwrap_err();
        assert!(matches!(err, LoanSimError::NumericOverflow(_)));
    }

    #[test]
    fn test_compound_factor_rejects_minus_100_pct() {
        assert!(compound_factor(dec!(-1), 12).is_err());
    }

    #[test]
    fn test_accumulation_factor() {
        assert_eq!(accumulation_factor(dec!(0), 240).unwrap(), dec!(240));
        let s = accumulation_factor(dec!(0.01), 240).unwrap();
        assert!((s - dec!(989.255)).abs() < dec!(0.001));
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_to_unit(dec!(2.5), 0), dec!(2));
        assert_eq!(round_to_unit(dec!(3.5), 0), dec!(4));
        assert_eq!(round_to_unit(dec!(1.005), 2), dec!(1.00));
        assert_eq!(round_to_unit(dec!(4800000.4), 0), dec!(4800000));
    }

    #[test]
    fn test_currency_unit() {
        assert_eq!(currency_unit(0), dec!(1));
        assert_eq!(currency_unit(2), dec!(0.01));
    }

    #[test]
    fn test_monthly_from_nominal() {
        assert_eq!(monthly_from_nominal_annual_pct(dec!(12)), dec!(0.01));
    }

    #[test]
    fn test_effective_annual_rate() {
        let ea = effective_annual_rate(dec!(0.01)).unwrap();
        // 1.01^12 - 1 ~ 12.6825%
        assert!((ea - dec!(0.126825)).abs() < dec!(0.000001));
    }
}

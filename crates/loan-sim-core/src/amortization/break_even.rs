//! Break-even ("Sentido" / "Equilibrio") signal policies.
//!
//! The signal compares a reference monthly cost, usually the market rent of
//! an equivalent property, against what the loan costs that month. Two
//! formulas are in use and neither is canonical, so the caller picks one.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanSimError;
use crate::time_value::round_to_unit;
use crate::types::Money;
use crate::LoanSimResult;

/// Markup applied to the reference value in the cost-equilibrium factor.
const REFERENCE_MARKUP: Decimal = dec!(1.1);
/// Share of the payment that counts as full capital efficiency.
const CAPITAL_EFFICIENCY_SHARE: Decimal = dec!(0.5);
/// Weight of the capital-efficiency factor in the composite score.
const CAPITAL_EFFICIENCY_WEIGHT: Decimal = dec!(0.6);
const PERCENT: Decimal = dec!(100);

/// How the per-month break-even signal is derived.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum BreakEvenPolicy {
    /// `reference - interest - insurance`, in currency units. Principal is
    /// equity building, not cost, so it is left out.
    #[default]
    Simple,
    /// Weighted score `FEC + 0.6 * FECap`, rounded to one decimal, where
    /// `FEC = (1 - payment / (reference * 1.1)) * 100` and
    /// `FECap = min(1, principal_portion / (payment * 0.5)) * 100`.
    Composite,
}

/// Per-month figures a policy may draw on.
#[derive(Debug, Clone, Copy)]
pub struct MonthlyBurden {
    pub reference_value: Money,
    /// Total payment for the month, insurance included.
    pub payment: Money,
    pub interest: Money,
    pub insurance: Money,
    pub principal_portion: Money,
}

impl BreakEvenPolicy {
    /// Preconditions that can be checked once the fixed payment is known,
    /// before any row is produced.
    pub fn validate(&self, reference_value: Money, payment: Money) -> LoanSimResult<()> {
        match self {
            BreakEvenPolicy::Simple => Ok(()),
            BreakEvenPolicy::Composite => {
                if reference_value <= Decimal::ZERO {
                    return Err(LoanSimError::invalid(
                        "reference_value",
                        "Composite break-even policy needs a positive reference value",
                    ));
                }
                if payment.is_zero() {
                    return Err(LoanSimError::DivisionByZero {
                        context: "composite break-even capital efficiency (payment is zero)"
                            .into(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Signal for one month. Callers run [`BreakEvenPolicy::validate`] first.
    pub fn signal(&self, m: &MonthlyBurden) -> LoanSimResult<Decimal> {
        match self {
            BreakEvenPolicy::Simple => m
                .reference_value
                .checked_sub(m.interest)
                .and_then(|v| v.checked_sub(m.insurance))
                .ok_or_else(|| LoanSimError::overflow("break-even signal")),
            BreakEvenPolicy::Composite => {
                self.validate(m.reference_value, m.payment)?;
                let fec = m
                    .reference_value
                    .checked_mul(REFERENCE_MARKUP)
                    .and_then(|marked_up| m.payment.checked_div(marked_up))
                    .and_then(|ratio| (Decimal::ONE - ratio).checked_mul(PERCENT))
                    .ok_or_else(|| LoanSimError::overflow("cost-equilibrium factor"))?;
                let efficiency = m
                    .principal_portion
                    .checked_div(m.payment * CAPITAL_EFFICIENCY_SHARE)
                    .ok_or_else(|| LoanSimError::overflow("capital-efficiency factor"))?;
                let fecap = efficiency.min(Decimal::ONE) * PERCENT;
                let score = fec
                    .checked_add(CAPITAL_EFFICIENCY_WEIGHT * fecap)
                    .ok_or_else(|| LoanSimError::overflow("composite score"))?;
                Ok(round_to_unit(score, 1))
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BreakEvenPolicy::Simple => "reference - interest - insurance",
            BreakEvenPolicy::Composite => "FEC + 0.6 x FECap (composite score)",
        }
    }
}

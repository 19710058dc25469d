//! Property purchase scenarios.
//!
//! Turns the figures a buyer thinks in (property price, down payment,
//! nominal annual rate in percent, term in years, purchase option percent)
//! into [`LoanParameters`], deriving the financed amount, the leasing
//! residual and the monthly life + earthquake insurance.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::schedule::{amortize, AmortizationOutput};
use crate::amortization::{BreakEvenPolicy, FinancingMode, LoanParameters};
use crate::error::LoanSimError;
use crate::time_value::{effective_annual_rate, monthly_from_nominal_annual_pct, round_to_unit};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LoanSimResult;

const DEFAULT_LIFE_RATE: Rate = dec!(0.000145);
const DEFAULT_EARTHQUAKE_RATE: Rate = dec!(0.0000995);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Monthly insurance premiums as fractions of the property value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InsuranceRates {
    pub life_rate: Rate,
    pub earthquake_rate: Rate,
}

impl Default for InsuranceRates {
    fn default() -> Self {
        Self {
            life_rate: DEFAULT_LIFE_RATE,
            earthquake_rate: DEFAULT_EARTHQUAKE_RATE,
        }
    }
}

/// A property purchase financed by housing credit or housing leasing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyScenario {
    /// Purchase price of the property
    pub property_value: Money,
    /// Cash paid up front
    pub down_payment: Money,
    /// Nominal annual rate in percent (12.0 = 1% per month)
    pub annual_rate_pct: Decimal,
    /// Term in years
    pub term_years: u32,
    /// Monthly market rent of an equivalent property
    #[serde(default)]
    pub reference_rent: Money,
    #[serde(default)]
    pub mode: FinancingMode,
    /// Leasing purchase option as percent of the property value
    #[serde(default)]
    pub purchase_option_pct: Decimal,
    #[serde(default)]
    pub insurance: InsuranceRates,
    #[serde(default)]
    pub break_even_policy: BreakEvenPolicy,
    #[serde(default)]
    pub currency_decimals: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutput {
    pub financed_amount: Money,
    pub residual_value: Money,
    pub monthly_rate: Rate,
    /// Effective annual rate implied by the monthly rate
    pub effective_annual_rate: Rate,
    pub insurance_per_month: Money,
    /// Payment charged every month, insurance included
    pub monthly_payment: Money,
    pub first_month_signal: Decimal,
    /// Whether the reference rent covers the first month's carrying cost
    pub signal_positive: bool,
    pub schedule: AmortizationOutput,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Life plus earthquake insurance for a property, each premium rounded to
/// the currency unit separately.
pub fn monthly_insurance(
    property_value: Money,
    rates: &InsuranceRates,
    currency_decimals: u32,
) -> LoanSimResult<Money> {
    let premium = |rate: Rate| {
        property_value
            .checked_mul(rate)
            .map(|p| round_to_unit(p, currency_decimals))
    };
    premium(rates.life_rate)
        .zip(premium(rates.earthquake_rate))
        .and_then(|(life, earthquake)| life.checked_add(earthquake))
        .ok_or_else(|| LoanSimError::overflow("monthly insurance"))
}

/// Whether a scenario error only says that this price and down payment
/// cannot be financed (down payment too large, or too little left to cover
/// the leasing residual). Sweeps treat those combinations as gaps.
pub(crate) fn is_unfinanceable(err: &LoanSimError) -> bool {
    matches!(
        err,
        LoanSimError::InvalidParameter { field, .. }
            if field == "down_payment" || field == "residual_value"
    )
}

impl PropertyScenario {
    /// Purchase option amount owed at the end of a leasing contract.
    pub fn residual_value(&self) -> LoanSimResult<Money> {
        match self.mode {
            FinancingMode::ResidualBalloon => self
                .property_value
                .checked_mul(self.purchase_option_pct)
                .map(|v| v / dec!(100))
                .ok_or_else(|| LoanSimError::overflow("purchase option")),
            FinancingMode::Amortizing => Ok(Decimal::ZERO),
        }
    }

    /// Derive engine parameters. The residual is carried by the contract, so
    /// it is taken out of the financed amount as well.
    pub fn to_loan_parameters(&self) -> LoanSimResult<LoanParameters> {
        self.validate()?;

        let residual_value = self.residual_value()?;
        let principal = self.property_value - self.down_payment - residual_value;
        if principal < Decimal::ZERO {
            return Err(LoanSimError::invalid(
                "down_payment",
                format!(
                    "Down payment {} plus residual {} exceeds property value {}",
                    self.down_payment, residual_value, self.property_value
                ),
            ));
        }

        Ok(LoanParameters {
            principal,
            monthly_rate: monthly_from_nominal_annual_pct(self.annual_rate_pct),
            term_months: self.term_years * 12,
            residual_value,
            insurance_per_month: monthly_insurance(
                self.property_value,
                &self.insurance,
                self.currency_decimals,
            )?,
            reference_value: self.reference_rent,
            mode: self.mode,
            break_even_policy: self.break_even_policy,
            currency_decimals: self.currency_decimals,
            first_payment_date: self.first_payment_date,
        })
    }

    fn validate(&self) -> LoanSimResult<()> {
        if self.property_value <= Decimal::ZERO {
            return Err(LoanSimError::invalid(
                "property_value",
                "Property value must be positive",
            ));
        }
        if self.down_payment < Decimal::ZERO {
            return Err(LoanSimError::invalid(
                "down_payment",
                "Down payment cannot be negative",
            ));
        }
        if self.down_payment > self.property_value {
            return Err(LoanSimError::invalid(
                "down_payment",
                "Down payment cannot exceed the property value",
            ));
        }
        if self.annual_rate_pct < Decimal::ZERO {
            return Err(LoanSimError::invalid(
                "annual_rate_pct",
                "Annual rate cannot be negative",
            ));
        }
        if self.term_years == 0 {
            return Err(LoanSimError::invalid(
                "term_years",
                "Term must be at least one year",
            ));
        }
        if self.term_years > u32::MAX / 12 {
            return Err(LoanSimError::invalid("term_years", "Term is too long"));
        }
        if self.purchase_option_pct < Decimal::ZERO || self.purchase_option_pct > dec!(100) {
            return Err(LoanSimError::invalid(
                "purchase_option_pct",
                "Purchase option must be between 0 and 100 percent",
            ));
        }
        if self.insurance.life_rate < Decimal::ZERO || self.insurance.earthquake_rate < Decimal::ZERO
        {
            return Err(LoanSimError::invalid(
                "insurance",
                "Insurance rates cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Derive the loan from a property scenario and run the full schedule.
pub fn simulate_scenario(
    scenario: &PropertyScenario,
) -> LoanSimResult<ComputationOutput<ScenarioOutput>> {
    let start = Instant::now();

    let params = scenario.to_loan_parameters()?;
    let amortized = amortize(&params)?;
    let mut warnings = amortized.warnings;

    if scenario.mode == FinancingMode::Amortizing && !scenario.purchase_option_pct.is_zero() {
        warnings.push("purchase_option_pct only applies to ResidualBalloon (leasing)".into());
    }

    let schedule = amortized.result;
    let first_month_signal = schedule.first_month_signal;

    let output = ScenarioOutput {
        financed_amount: params.principal,
        residual_value: params.residual_value,
        monthly_rate: params.monthly_rate,
        effective_annual_rate: effective_annual_rate(params.monthly_rate)?,
        insurance_per_month: params.insurance_per_month,
        monthly_payment: schedule.fixed_payment,
        first_month_signal,
        signal_positive: first_month_signal > Decimal::ZERO,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Property scenario: financed = price - down payment - purchase option",
        scenario,
        warnings,
        elapsed,
        output,
    ))
}

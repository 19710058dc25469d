//! Month-by-month amortization schedule for housing credit and leasing.
//!
//! The fixed payment is computed once and rounded to the currency unit,
//! insurance is added on top as a pass-through, and every month's interest
//! is rounded on the balance carried in from the previous month. Rounding
//! drift left on the last month is absorbed by settling the final balance
//! to the contractual target (zero, or the residual for leasing).

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::break_even::{BreakEvenPolicy, MonthlyBurden};
use super::payment::{compute_fixed_payment, validate_financing};
use crate::error::LoanSimError;
use crate::time_value::{
    accumulation_factor, currency_unit, round_to_unit, MAX_CURRENCY_DECIMALS,
};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LoanSimResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Financing structure.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum FinancingMode {
    /// Mortgage-style credit: balance reaches zero on the last payment.
    #[default]
    Amortizing,
    /// Leasing: the residual (purchase option) is still owed at term end.
    ResidualBalloon,
}

/// Immutable financing configuration fed to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanParameters {
    /// Amount financed
    pub principal: Money,
    /// Periodic (monthly) rate as a decimal fraction
    pub monthly_rate: Rate,
    /// Number of monthly payments
    pub term_months: u32,
    /// Amount owed at term end; ignored unless mode is ResidualBalloon
    #[serde(default)]
    pub residual_value: Money,
    /// Fixed monthly insurance surcharge, never amortized
    #[serde(default)]
    pub insurance_per_month: Money,
    /// Reference monthly cost (e.g. market rent) for the break-even signal
    #[serde(default)]
    pub reference_value: Money,
    #[serde(default)]
    pub mode: FinancingMode,
    #[serde(default)]
    pub break_even_policy: BreakEvenPolicy,
    /// Decimals of the smallest currency unit (0 = whole units)
    #[serde(default)]
    pub currency_decimals: u32,
    /// Date of the first payment; later payments fall on the same day of
    /// each following month
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
}

impl LoanParameters {
    /// Residual actually owed at term end under the selected mode.
    pub fn effective_residual(&self) -> Money {
        match self.mode {
            FinancingMode::ResidualBalloon => self.residual_value,
            FinancingMode::Amortizing => Decimal::ZERO,
        }
    }
}

/// A single month of the schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleRow {
    /// Month number (1-indexed)
    pub month: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    /// Total payment, insurance included (constant across the schedule)
    pub payment: Money,
    /// Interest on the balance carried into the month
    pub interest: Money,
    pub principal_portion: Money,
    pub insurance: Money,
    /// Outstanding balance after this month's payment, floored at zero.
    /// The last row is settled to the contractual target (zero, or the
    /// residual for leasing) rather than floored; whatever that settlement
    /// absorbed is reported in [`ScheduleTotals::final_balance_drift`].
    pub balance: Money,
    pub break_even_signal: Decimal,
}

/// Aggregates over the whole schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleTotals {
    pub total_paid: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_insurance: Money,
    /// Unsettled final balance minus the contractual target
    pub final_balance_drift: Money,
}

/// Full result of [`amortize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    /// Unrounded annuity payment, insurance excluded
    pub base_payment: Money,
    /// Rounded payment plus insurance, as charged every month
    pub fixed_payment: Money,
    pub mode: FinancingMode,
    pub break_even_policy: BreakEvenPolicy,
    pub first_month_signal: Decimal,
    pub totals: ScheduleTotals,
    pub rows: Vec<ScheduleRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Ordered schedule rows for months `1..=term_months`.
pub fn build_schedule(params: &LoanParameters) -> LoanSimResult<Vec<ScheduleRow>> {
    Ok(run_schedule(params)?.rows)
}

/// Schedule plus payment breakdown, totals and warnings, wrapped in the
/// standard output envelope.
pub fn amortize(params: &LoanParameters) -> LoanSimResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let run = run_schedule(params)?;

    if params.monthly_rate.is_zero() {
        warnings.push("Zero interest rate: straight-line payment used".to_string());
    }
    if params.mode == FinancingMode::Amortizing && !params.residual_value.is_zero() {
        warnings.push(format!(
            "residual_value {} ignored in Amortizing mode",
            params.residual_value
        ));
    }
    let tolerance = drift_tolerance(params)?;
    if run.drift.abs() > tolerance {
        warnings.push(format!(
            "Final balance drift {} exceeds rounding tolerance {}",
            run.drift, tolerance
        ));
    }

    let totals = ScheduleTotals {
        total_paid: column_total(&run.rows, "total_paid", |r| r.payment)?,
        total_interest: column_total(&run.rows, "total_interest", |r| r.interest)?,
        total_principal: column_total(&run.rows, "total_principal", |r| r.principal_portion)?,
        total_insurance: column_total(&run.rows, "total_insurance", |r| r.insurance)?,
        final_balance_drift: run.drift,
    };

    let output = AmortizationOutput {
        base_payment: run.base_payment,
        fixed_payment: run.fixed_payment,
        mode: params.mode,
        break_even_policy: params.break_even_policy,
        first_month_signal: run
            .rows
            .first()
            .map(|r| r.break_even_signal)
            .unwrap_or_default(),
        totals,
        rows: run.rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let methodology = format!(
        "Fixed-payment amortization ({:?}), per-period rounded interest, break-even: {}",
        params.mode,
        params.break_even_policy.label()
    );

    Ok(with_metadata(&methodology, params, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_parameters(params: &LoanParameters) -> LoanSimResult<()> {
    validate_financing(
        params.principal,
        params.monthly_rate,
        params.term_months,
        params.effective_residual(),
    )?;
    if params.insurance_per_month < Decimal::ZERO {
        return Err(LoanSimError::invalid(
            "insurance_per_month",
            "Insurance surcharge cannot be negative",
        ));
    }
    if params.currency_decimals > MAX_CURRENCY_DECIMALS {
        return Err(LoanSimError::invalid(
            "currency_decimals",
            format!("At most {MAX_CURRENCY_DECIMALS} decimals are supported"),
        ));
    }
    if let Some(first) = params.first_payment_date {
        if payment_date(first, params.term_months).is_none() {
            return Err(LoanSimError::invalid(
                "first_payment_date",
                "Payment dates run past the supported calendar range",
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Schedule recurrence
// ---------------------------------------------------------------------------

struct ScheduleRun {
    base_payment: Money,
    fixed_payment: Money,
    rows: Vec<ScheduleRow>,
    drift: Money,
}

fn run_schedule(params: &LoanParameters) -> LoanSimResult<ScheduleRun> {
    validate_parameters(params)?;

    let residual = params.effective_residual();
    let decimals = params.currency_decimals;
    let insurance = params.insurance_per_month;
    let rate = params.monthly_rate;

    let base_payment =
        compute_fixed_payment(params.principal, rate, params.term_months, residual)?;
    let fixed_payment = round_to_unit(base_payment, decimals)
        .checked_add(insurance)
        .ok_or_else(|| LoanSimError::overflow("payment plus insurance"))?;

    params
        .break_even_policy
        .validate(params.reference_value, fixed_payment)?;

    log::debug!(
        "amortizing {} over {} months at {}: payment {} (base {})",
        params.principal,
        params.term_months,
        rate,
        fixed_payment,
        base_payment
    );

    let mut rows = Vec::with_capacity(params.term_months as usize);
    let mut balance = params.principal;
    let mut drift = Decimal::ZERO;

    for month in 1..=params.term_months {
        let interest = round_to_unit(
            balance
                .checked_mul(rate)
                .ok_or_else(|| LoanSimError::overflow("monthly interest"))?,
            decimals,
        );
        let principal_portion = fixed_payment
            .checked_sub(interest)
            .and_then(|v| v.checked_sub(insurance))
            .ok_or_else(|| LoanSimError::overflow("principal portion"))?;

        let break_even_signal = params.break_even_policy.signal(&MonthlyBurden {
            reference_value: params.reference_value,
            payment: fixed_payment,
            interest,
            insurance,
            principal_portion,
        })?;

        balance = balance
            .checked_sub(principal_portion)
            .ok_or_else(|| LoanSimError::overflow("running balance"))?;

        let shown_balance = if month == params.term_months {
            drift = balance - residual;
            residual
        } else {
            balance.max(Decimal::ZERO)
        };

        rows.push(ScheduleRow {
            month,
            payment_date: params
                .first_payment_date
                .and_then(|d| payment_date(d, month)),
            payment: fixed_payment,
            interest,
            principal_portion,
            insurance,
            balance: shown_balance,
            break_even_signal,
        });
    }

    if !drift.is_zero() {
        log::debug!("settled final balance drift of {drift}");
    }

    Ok(ScheduleRun {
        base_payment,
        fixed_payment,
        rows,
        drift,
    })
}

/// Largest final-balance drift explained by rounding: half a unit on the
/// payment plus half a unit on each month's interest, compounded to term end.
pub fn drift_tolerance(params: &LoanParameters) -> LoanSimResult<Money> {
    currency_unit(params.currency_decimals)
        .checked_mul(accumulation_factor(params.monthly_rate, params.term_months)?)
        .ok_or_else(|| LoanSimError::overflow("drift tolerance"))
}

fn column_total(
    rows: &[ScheduleRow],
    column: &str,
    value: impl Fn(&ScheduleRow) -> Money,
) -> LoanSimResult<Money> {
    rows.iter().try_fold(Decimal::ZERO, |acc, row| {
        acc.checked_add(value(row))
            .ok_or_else(|| LoanSimError::overflow(column))
    })
}

fn payment_date(first: NaiveDate, month: u32) -> Option<NaiveDate> {
    first.checked_add_months(Months::new(month.saturating_sub(1)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

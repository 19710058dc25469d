//! Rent-versus-payment profitability.
//!
//! Profit is the reference rent minus the unrounded annuity payment and
//! the insurance: what an owner renting the property out would pocket each
//! month. Two views are offered: profit across down payments, and profit
//! over time as the rent is indexed once a year.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::scenario::{is_unfinanceable, PropertyScenario};
use super::sweep::find_zero_crossings;
use crate::amortization::{compute_fixed_payment, LoanParameters};
use crate::error::LoanSimError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LoanSimResult;

const MAX_POINTS: u32 = 10_000;

fn default_max_down_payment_fraction() -> Rate {
    dec!(0.8)
}

fn default_points() -> u32 {
    100
}

fn default_rent_growth_pct() -> Decimal {
    dec!(4.0)
}

// ---------------------------------------------------------------------------
// Profit by down payment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownPaymentSweepInput {
    /// Scenario whose down payment is varied
    pub scenario: PropertyScenario,
    /// Smallest down payment considered
    pub min_down_payment: Money,
    /// Largest down payment as a fraction of the property value
    #[serde(default = "default_max_down_payment_fraction")]
    pub max_down_payment_fraction: Rate,
    /// Number of evenly spaced points, both ends included
    #[serde(default = "default_points")]
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DownPaymentPoint {
    pub down_payment: Money,
    pub financed_amount: Money,
    /// Unrounded annuity payment plus insurance
    pub monthly_cost: Money,
    pub monthly_profit: Money,
    /// `profit * 12 / (down payment + residual)` in percent; `None` when
    /// nothing is invested up front
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_return_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownPaymentSweepOutput {
    pub points: Vec<DownPaymentPoint>,
    /// Down payment at which the monthly profit turns non-negative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even_down_payment: Option<Money>,
}

pub fn profit_by_down_payment(
    input: &DownPaymentSweepInput,
) -> LoanSimResult<ComputationOutput<DownPaymentSweepOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let max_down = input
        .scenario
        .property_value
        .checked_mul(input.max_down_payment_fraction)
        .ok_or_else(|| LoanSimError::overflow("maximum down payment"))?;
    validate_sweep(input, max_down)?;
    input.scenario.to_loan_parameters()?;

    let down_payments = linspace(input.min_down_payment, max_down, input.points);
    let mut points = Vec::with_capacity(down_payments.len());
    let mut skipped = 0usize;

    for down_payment in down_payments {
        let scenario = PropertyScenario {
            down_payment,
            ..input.scenario.clone()
        };
        // Large down payments can leave less to finance than the leasing
        // residual; those points are skipped.
        let (params, monthly_cost) = match scenario
            .to_loan_parameters()
            .and_then(|p| carrying_cost(&p).map(|c| (p, c)))
        {
            Ok(financed) => financed,
            Err(e) if is_unfinanceable(&e) => {
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        let monthly_profit = params
            .reference_value
            .checked_sub(monthly_cost)
            .ok_or_else(|| LoanSimError::overflow("monthly profit"))?;

        let invested = down_payment + params.residual_value;
        let annual_return_pct = if invested.is_zero() {
            None
        } else {
            Some(
                monthly_profit
                    .checked_mul(dec!(12))
                    .and_then(|annual| annual.checked_div(invested))
                    .and_then(|r| r.checked_mul(dec!(100)))
                    .ok_or_else(|| LoanSimError::overflow("annual return"))?,
            )
        };

        points.push(DownPaymentPoint {
            down_payment,
            financed_amount: params.principal,
            monthly_cost,
            monthly_profit,
            annual_return_pct,
        });
    }

    if skipped > 0 {
        warnings.push(format!(
            "{skipped} down payments skipped: financed amount below the residual"
        ));
    }
    if points.iter().any(|p| p.annual_return_pct.is_none()) {
        warnings.push("Return undefined where nothing is invested up front".into());
    }

    let xs: Vec<Decimal> = points.iter().map(|p| p.down_payment).collect();
    let ys: Vec<Option<Decimal>> = points.iter().map(|p| Some(p.monthly_profit)).collect();
    let break_even_down_payment = find_zero_crossings(&xs, &ys).into_iter().next();

    let output = DownPaymentSweepOutput {
        points,
        break_even_down_payment,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly profit = reference rent - (annuity payment + insurance) across down payments",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_sweep(input: &DownPaymentSweepInput, max_down: Money) -> LoanSimResult<()> {
    if input.points < 2 || input.points > MAX_POINTS {
        return Err(LoanSimError::invalid(
            "points",
            format!("Number of points must be between 2 and {MAX_POINTS}"),
        ));
    }
    if input.max_down_payment_fraction <= Decimal::ZERO
        || input.max_down_payment_fraction > Decimal::ONE
    {
        return Err(LoanSimError::invalid(
            "max_down_payment_fraction",
            "Fraction must be in (0, 1]",
        ));
    }
    if input.min_down_payment < Decimal::ZERO || input.min_down_payment >= max_down {
        return Err(LoanSimError::invalid(
            "min_down_payment",
            format!("Minimum down payment must be in [0, {max_down})"),
        ));
    }
    Ok(())
}

/// `count` evenly spaced values from `lo` to `hi` inclusive.
fn linspace(lo: Decimal, hi: Decimal, count: u32) -> Vec<Decimal> {
    let step = (hi - lo) / Decimal::from(count - 1);
    (0..count)
        .map(|i| if i == count - 1 { hi } else { lo + step * Decimal::from(i) })
        .collect()
}

// ---------------------------------------------------------------------------
// Profit over time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitTimelineInput {
    pub scenario: PropertyScenario,
    /// Annual rent indexation in percent (e.g. CPI), applied every 12 months
    #[serde(default = "default_rent_growth_pct")]
    pub annual_rent_growth_pct: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelinePoint {
    pub month: u32,
    pub reference_rent: Money,
    pub monthly_profit: Money,
    pub cumulative_profit: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitTimelineOutput {
    pub monthly_cost: Money,
    pub points: Vec<TimelinePoint>,
    /// First month whose profit is non-negative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_profitable_month: Option<u32>,
    pub total_profit: Money,
}

pub fn profit_timeline(
    input: &ProfitTimelineInput,
) -> LoanSimResult<ComputationOutput<ProfitTimelineOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_rent_growth_pct <= dec!(-100) {
        return Err(LoanSimError::invalid(
            "annual_rent_growth_pct",
            "Rent growth must be greater than -100%",
        ));
    }

    let params = input.scenario.to_loan_parameters()?;
    let monthly_cost = carrying_cost(&params)?;
    let growth = Decimal::ONE + input.annual_rent_growth_pct / dec!(100);

    let mut rent = params.reference_value;
    let mut cumulative = Decimal::ZERO;
    let mut points = Vec::with_capacity(params.term_months as usize);

    for month in 1..=params.term_months {
        // Indexed at the start of each new year: months 13, 25, ...
        if month > 1 && month % 12 == 1 {
            rent = rent
                .checked_mul(growth)
                .ok_or_else(|| LoanSimError::NumericOverflow("indexed rent".into()))?;
        }
        let monthly_profit = rent
            .checked_sub(monthly_cost)
            .ok_or_else(|| LoanSimError::overflow("monthly profit"))?;
        cumulative = cumulative
            .checked_add(monthly_profit)
            .ok_or_else(|| LoanSimError::overflow("cumulative profit"))?;
        points.push(TimelinePoint {
            month,
            reference_rent: rent,
            monthly_profit,
            cumulative_profit: cumulative,
        });
    }

    let first_profitable_month = points
        .iter()
        .find(|p| p.monthly_profit >= Decimal::ZERO)
        .map(|p| p.month);
    if first_profitable_month.is_none() {
        warnings.push("Rent never covers the monthly payment within the term".into());
    }

    let output = ProfitTimelineOutput {
        monthly_cost,
        points,
        first_profitable_month,
        total_profit: cumulative,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly profit with reference rent indexed annually",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Unrounded annuity payment plus insurance.
fn carrying_cost(params: &LoanParameters) -> LoanSimResult<Money> {
    let payment = compute_fixed_payment(
        params.principal,
        params.monthly_rate,
        params.term_months,
        params.effective_residual(),
    )?;
    payment
        .checked_add(params.insurance_per_month)
        .ok_or_else(|| LoanSimError::overflow("carrying cost"))
}

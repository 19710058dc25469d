use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanSimError;
use crate::time_value::compound_factor;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LoanSimResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub principal: Money,
    /// Periodic (monthly) rate as a decimal fraction
    pub monthly_rate: Rate,
    pub term_months: u32,
    /// Amount still owed after the last payment (leasing purchase option)
    #[serde(default)]
    pub residual_value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutput {
    /// Unrounded fixed payment, insurance excluded
    pub fixed_payment: Money,
    pub total_of_payments: Money,
    /// Interest paid over the term, the residual left aside
    pub total_interest: Money,
}

/// Fixed periodic payment that takes `principal` down to `residual` in
/// `term_months` equal instalments.
///
/// With no residual this is the standard annuity
/// `P * r * (1+r)^n / ((1+r)^n - 1)`; with a residual (leasing purchase
/// option) the residual's share is taken out of the numerator:
/// `(P * r * (1+r)^n - R * r) / ((1+r)^n - 1)`.
///
/// A zero rate falls back to straight-line `(P - R) / n`. The result is
/// not rounded.
pub fn compute_fixed_payment(
    principal: Money,
    monthly_rate: Rate,
    term_months: u32,
    residual: Money,
) -> LoanSimResult<Money> {
    validate_financing(principal, monthly_rate, term_months, residual)?;

    let n = Decimal::from(term_months);

    if monthly_rate.is_zero() {
        return (principal - residual)
            .checked_div(n)
            .ok_or_else(|| LoanSimError::overflow("straight-line payment"));
    }

    let factor = compound_factor(monthly_rate, term_months)?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(LoanSimError::DivisionByZero {
            context: "annuity factor (1+r)^n - 1".into(),
        });
    }

    let numerator = principal
        .checked_mul(monthly_rate)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_sub(residual * monthly_rate))
        .ok_or_else(|| LoanSimError::overflow("payment numerator"))?;

    numerator
        .checked_div(denominator)
        .ok_or_else(|| LoanSimError::overflow("annuity payment"))
}

/// [`compute_fixed_payment`] wrapped in the standard output envelope.
pub fn calculate_payment(input: &PaymentInput) -> LoanSimResult<ComputationOutput<PaymentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let fixed_payment = compute_fixed_payment(
        input.principal,
        input.monthly_rate,
        input.term_months,
        input.residual_value,
    )?;
    if input.monthly_rate.is_zero() {
        warnings.push("Zero interest rate: straight-line payment used".to_string());
    }

    let total_of_payments = fixed_payment
        .checked_mul(Decimal::from(input.term_months))
        .ok_or_else(|| LoanSimError::overflow("total of payments"))?;
    let output = PaymentOutput {
        fixed_payment,
        total_of_payments,
        total_interest: total_of_payments - (input.principal - input.residual_value),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annuity payment (P*r*(1+r)^n - R*r) / ((1+r)^n - 1)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Range checks shared by the payment formula and the schedule builder.
pub(crate) fn validate_financing(
    principal: Money,
    monthly_rate: Rate,
    term_months: u32,
    residual: Money,
) -> LoanSimResult<()> {
    if term_months < 1 {
        return Err(LoanSimError::invalid(
            "term_months",
            "Term must be at least one month",
        ));
    }
    if monthly_rate < Decimal::ZERO {
        return Err(LoanSimError::invalid(
            "monthly_rate",
            "Monthly rate cannot be negative",
        ));
    }
    if principal < Decimal::ZERO {
        return Err(LoanSimError::invalid(
            "principal",
            "Principal cannot be negative",
        ));
    }
    if residual < Decimal::ZERO {
        return Err(LoanSimError::invalid(
            "residual_value",
            "Residual value cannot be negative",
        ));
    }
    if residual > principal {
        return Err(LoanSimError::invalid(
            "residual_value",
            format!("Residual value {residual} exceeds principal {principal}"),
        ));
    }
    Ok(())
}

//! Break-even grid over property price and down payment.
//!
//! Every cell is an independent scenario run; the grid feeds a contour
//! plot of the first-month break-even signal, and the zero crossings mark
//! the down payment at which renting and buying balance out for each price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::scenario::{is_unfinanceable, PropertyScenario};
use crate::amortization::build_schedule;
use crate::error::LoanSimError;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::LoanSimResult;

/// Upper bound on price x down-payment cells in one sweep.
pub const MAX_GRID_CELLS: usize = 250_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Evenly spaced values `start, start + step, ...` strictly below `stop`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AxisRange {
    pub start: Decimal,
    pub stop: Decimal,
    pub step: Decimal,
}

impl AxisRange {
    pub fn values(&self, field: &str) -> LoanSimResult<Vec<Decimal>> {
        if self.step <= Decimal::ZERO {
            return Err(LoanSimError::invalid(field, "Range step must be positive"));
        }
        if self.stop <= self.start {
            return Err(LoanSimError::invalid(
                field,
                format!("Range is empty: start {} >= stop {}", self.start, self.stop),
            ));
        }
        let span = self
            .stop
            .checked_sub(self.start)
            .ok_or_else(|| LoanSimError::overflow("range span"))?;
        // Dividing by a tiny step overflows only for an oversized range
        let count = span
            .checked_div(self.step)
            .map(|n| n.ceil())
            .unwrap_or(Decimal::MAX);
        if count > Decimal::from(MAX_GRID_CELLS) {
            return Err(LoanSimError::invalid(
                field,
                format!("Range has more than {MAX_GRID_CELLS} points"),
            ));
        }

        let mut values = Vec::new();
        let mut current = Some(self.start);
        // A step past Decimal::MAX is also past `stop`
        while let Some(value) = current.filter(|v| *v < self.stop) {
            values.push(value);
            current = value.checked_add(self.step);
        }
        Ok(values)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakEvenGridInput {
    /// Scenario supplying rate, term, rent, mode and insurance; its price and
    /// down payment are replaced cell by cell
    pub base: PropertyScenario,
    pub property_values: AxisRange,
    pub down_payments: AxisRange,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridCell {
    pub property_value: Money,
    pub down_payment: Money,
    /// First-month signal; `None` when the combination cannot be financed
    pub signal: Option<Decimal>,
}

/// Interpolated down payment at which the signal crosses zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZeroCrossing {
    pub property_value: Money,
    pub down_payment: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakEvenGridOutput {
    pub property_values: Vec<Money>,
    pub down_payments: Vec<Money>,
    /// `signals[i][j]` for `property_values[i]`, `down_payments[j]`
    pub signals: Vec<Vec<Option<Decimal>>>,
    pub cells: Vec<GridCell>,
    pub zero_crossings: Vec<ZeroCrossing>,
    pub positive_cells: usize,
    pub infeasible_cells: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn break_even_grid(
    input: &BreakEvenGridInput,
) -> LoanSimResult<ComputationOutput<BreakEvenGridOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let property_values = input.property_values.values("property_values")?;
    let down_payments = input.down_payments.values("down_payments")?;

    let total = property_values.len() * down_payments.len();
    if total > MAX_GRID_CELLS {
        return Err(LoanSimError::invalid(
            "property_values",
            format!("Grid of {total} cells exceeds the limit of {MAX_GRID_CELLS}"),
        ));
    }
    if input.property_values.start <= Decimal::ZERO {
        return Err(LoanSimError::invalid(
            "property_values",
            "Property values must be positive",
        ));
    }
    if input.down_payments.start < Decimal::ZERO {
        return Err(LoanSimError::invalid(
            "down_payments",
            "Down payments cannot be negative",
        ));
    }
    // Surface problems with the shared inputs (rate, term, policy) up front
    // instead of reporting every cell as infeasible.
    input.base.to_loan_parameters()?;

    let mut signals = Vec::with_capacity(property_values.len());
    let mut cells = Vec::with_capacity(total);
    let mut zero_crossings = Vec::new();

    for &property_value in &property_values {
        let line = down_payments
            .iter()
            .map(|&down_payment| first_month_signal(&input.base, property_value, down_payment))
            .collect::<LoanSimResult<Vec<Option<Decimal>>>>()?;

        for (&down_payment, &signal) in down_payments.iter().zip(line.iter()) {
            cells.push(GridCell {
                property_value,
                down_payment,
                signal,
            });
        }
        for down_payment in find_zero_crossings(&down_payments, &line) {
            zero_crossings.push(ZeroCrossing {
                property_value,
                down_payment,
            });
        }
        signals.push(line);
    }

    let positive_cells = cells
        .iter()
        .filter(|c| c.signal.is_some_and(|s| s > Decimal::ZERO))
        .count();
    let infeasible_cells = cells.iter().filter(|c| c.signal.is_none()).count();

    if infeasible_cells > 0 {
        warnings.push(format!(
            "{infeasible_cells} of {total} cells cannot be financed and carry no signal"
        ));
    }
    if zero_crossings.is_empty() {
        warnings.push("Signal does not cross zero anywhere on the grid".into());
    }
    log::debug!(
        "break-even grid: {} cells, {} positive, {} crossings",
        total,
        positive_cells,
        zero_crossings.len()
    );

    let output = BreakEvenGridOutput {
        property_values,
        down_payments,
        signals,
        cells,
        zero_crossings,
        positive_cells,
        infeasible_cells,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "First-month break-even signal over property price x down payment",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `Ok(None)` when the combination cannot be financed; any other failure
/// aborts the sweep.
fn first_month_signal(
    base: &PropertyScenario,
    property_value: Money,
    down_payment: Money,
) -> LoanSimResult<Option<Decimal>> {
    let scenario = PropertyScenario {
        property_value,
        down_payment,
        ..base.clone()
    };
    match scenario
        .to_loan_parameters()
        .and_then(|params| build_schedule(&params))
    {
        Ok(rows) => Ok(rows.first().map(|r| r.break_even_signal)),
        Err(e) if is_unfinanceable(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Positions along `xs` where `ys` touches or changes sign, linearly
/// interpolated between neighbouring feasible points.
pub(crate) fn find_zero_crossings(xs: &[Decimal], ys: &[Option<Decimal>]) -> Vec<Decimal> {
    let mut crossings = Vec::new();

    for i in 0..xs.len().min(ys.len()) {
        let Some(y0) = ys[i] else { continue };
        if y0.is_zero() {
            crossings.push(xs[i]);
            continue;
        }
        let Some(Some(y1)) = ys.get(i + 1) else {
            continue;
        };
        if y1.is_zero() || y0.is_sign_negative() == y1.is_sign_negative() {
            continue;
        }
        let (x0, x1) = (xs[i], xs[i + 1]);
        crossings.push(x0 + (x1 - x0) * (-y0) / (*y1 - y0));
    }

    crossings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::{BreakEvenPolicy, FinancingMode};
    use crate::analysis::scenario::InsuranceRates;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn base() -> PropertyScenario {
        PropertyScenario {
            property_value: dec!(530000000),
            down_payment: dec!(50000000),
            annual_rate_pct: dec!(12),
            term_years: 20,
            reference_rent: dec!(3000000),
            mode: FinancingMode::Amortizing,
            purchase_option_pct: Decimal::ZERO,
            insurance: InsuranceRates::default(),
            break_even_policy: BreakEvenPolicy::Simple,
            currency_decimals: 0,
            first_payment_date: None,
        }
    }

    #[test]
    fn test_axis_range_exclusive_stop() {
        let r = AxisRange {
            start: dec!(0),
            stop: dec!(20),
            step: dec!(5),
        };
        assert_eq!(
            r.values("x").unwrap(),
            vec![dec!(0), dec!(5), dec!(10), dec!(15)]
        );
    }

    #[test]
    fn test_axis_range_rejects_bad_step() {
        let r = AxisRange {
            start: dec!(0),
            stop: dec!(20),
            step: dec!(0),
        };
        assert!(r.values("x").is_err());
    }

    #[test]
    fn test_axis_range_rejects_empty() {
        let r = AxisRange {
            start: dec!(10),
            stop: dec!(10),
            step: dec!(1),
        };
        assert!(r.values("x").is_err());
    }

    #[test]
    fn test_axis_range_near_decimal_max() {
        let r = AxisRange {
            start: Decimal::MAX - Decimal::ONE,
            stop: Decimal::MAX,
            step: dec!(10),
        };
        assert_eq!(r.values("x").unwrap(), vec![Decimal::MAX - Decimal::ONE]);
    }

    #[test]
    fn test_axis_range_span_overflow() {
        let r = AxisRange {
            start: Decimal::MIN,
            stop: Decimal::MAX,
            step: Decimal::MAX,
        };
        match r.values("x").unwrap_err() {
            LoanSimError::NumericOverflow(_) => {}
            other => panic!("Expected NumericOverflow, got {other:?}"),
        }
    }

    #[test]
    fn test_axis_range_tiny_step_rejected() {
        let r = AxisRange {
            start: dec!(0),
            stop: dec!(1000000000000000000000),
            step: dec!(0.0000000000000000001),
        };
        assert!(r.values("x").is_err());
    }

    #[test]
    fn test_zero_crossing_interpolated() {
        let xs = vec![dec!(0), dec!(10), dec!(20)];
        let ys = vec![Some(dec!(-10)), Some(dec!(-5)), Some(dec!(15))];
        assert_eq!(find_zero_crossings(&xs, &ys), vec![dec!(12.5)]);
    }

    #[test]
    fn test_zero_crossing_exact_hit_not_duplicated() {
        let xs = vec![dec!(0), dec!(10), dec!(20)];
        let ys = vec![Some(dec!(-10)), Some(dec!(0)), Some(dec!(10))];
        assert_eq!(find_zero_crossings(&xs, &ys), vec![dec!(10)]);
    }

    #[test]
    fn test_zero_crossing_skips_infeasible() {
        let xs = vec![dec!(0), dec!(10), dec!(20)];
        let ys = vec![Some(dec!(-10)), None, Some(dec!(10))];
        assert!(find_zero_crossings(&xs, &ys).is_empty());
    }

    #[test]
    fn test_grid_shape_and_crossing() {
        let input = BreakEvenGridInput {
            base: base(),
            property_values: AxisRange {
                start: dec!(300000000),
                stop: dec!(400000000),
                step: dec!(50000000),
            },
            down_payments: AxisRange {
                start: dec!(0),
                stop: dec!(300000000),
                step: dec!(25000000),
            },
        };
        let out = break_even_grid(&input).unwrap();
        let r = &out.result;
        assert_eq!(r.property_values.len(), 2);
        assert_eq!(r.down_payments.len(), 12);
        assert_eq!(r.cells.len(), 24);
        assert_eq!(r.signals[0].len(), 12);

        // Larger down payments shrink interest, so the signal rises along a row
        for line in &r.signals {
            let feasible: Vec<Decimal> = line.iter().flatten().copied().collect();
            assert!(feasible.windows(2).all(|w| w[1] >= w[0]));
        }

        // Each price has exactly one break-even down payment on this grid
        assert_eq!(r.zero_crossings.len(), 2);
        for c in &r.zero_crossings {
            let line_idx = r
                .property_values
                .iter()
                .position(|p| *p == c.property_value)
                .unwrap();
            let signal_at_zero_down = r.signals[line_idx][0].unwrap();
            assert!(signal_at_zero_down < Decimal::ZERO);
            assert!(c.down_payment > Decimal::ZERO && c.down_payment < c.property_value);
        }
    }

    #[test]
    fn test_grid_marks_infeasible_cells() {
        let input = BreakEvenGridInput {
            base: base(),
            property_values: AxisRange {
                start: dec!(100000000),
                stop: dec!(150000000),
                step: dec!(50000000),
            },
            down_payments: AxisRange {
                start: dec!(50000000),
                stop: dec!(250000000),
                step: dec!(100000000),
            },
        };
        let out = break_even_grid(&input).unwrap();
        // 150M down on a 100M property cannot be financed
        assert_eq!(out.result.cells[1].signal, None);
        assert_eq!(out.result.infeasible_cells, 1);
        assert!(out.warnings.iter().any(|w| w.contains("cannot be financed")));
    }

    #[test]
    fn test_grid_rejects_invalid_base() {
        let mut b = base();
        b.term_years = 0;
        let input = BreakEvenGridInput {
            base: b,
            property_values: AxisRange {
                start: dec!(100),
                stop: dec!(200),
                step: dec!(50),
            },
            down_payments: AxisRange {
                start: dec!(0),
                stop: dec!(50),
                step: dec!(10),
            },
        };
        assert!(break_even_grid(&input).is_err());
    }

    #[test]
    fn test_grid_propagates_composite_division_by_zero() {
        // Paying the full price in cash with no insurance leaves a zero
        // payment, which the composite score cannot divide by
        let input = BreakEvenGridInput {
            base: PropertyScenario {
                break_even_policy: BreakEvenPolicy::Composite,
                insurance: InsuranceRates {
                    life_rate: Decimal::ZERO,
                    earthquake_rate: Decimal::ZERO,
                },
                ..base()
            },
            property_values: AxisRange {
                start: dec!(100),
                stop: dec!(200),
                step: dec!(100),
            },
            down_payments: AxisRange {
                start: dec!(0),
                stop: dec!(200),
                step: dec!(100),
            },
        };
        match break_even_grid(&input).unwrap_err() {
            LoanSimError::DivisionByZero { .. } => {}
            other => panic!("Expected DivisionByZero, got {other:?}"),
        }
    }

    #[test]
    fn test_grid_rejects_negative_down_payments() {
        let input = BreakEvenGridInput {
            base: base(),
            property_values: AxisRange {
                start: dec!(100),
                stop: dec!(200),
                step: dec!(100),
            },
            down_payments: AxisRange {
                start: dec!(-50),
                stop: dec!(50),
                step: dec!(50),
            },
        };
        match break_even_grid(&input).unwrap_err() {
            LoanSimError::InvalidParameter { field, .. } => assert_eq!(field, "down_payments"),
            other => panic!("Expected InvalidParameter, got {other:?}"),
        }
    }
}

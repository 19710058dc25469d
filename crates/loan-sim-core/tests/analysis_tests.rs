use loan_sim_core::amortization::{BreakEvenPolicy, FinancingMode};
use loan_sim_core::analysis::profitability::{
    profit_by_down_payment, profit_timeline, DownPaymentSweepInput, ProfitTimelineInput,
};
use loan_sim_core::analysis::scenario::{simulate_scenario, InsuranceRates, PropertyScenario};
use loan_sim_core::analysis::sweep::{break_even_grid, AxisRange, BreakEvenGridInput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Dashboard defaults: 530M property, 50M down, 12% nominal, 20 years
// ===========================================================================

fn dashboard_defaults(mode: FinancingMode) -> PropertyScenario {
    PropertyScenario {
        property_value: dec!(530_000_000),
        down_payment: dec!(50_000_000),
        annual_rate_pct: dec!(12.0),
        term_years: 20,
        reference_rent: dec!(3_000_000),
        mode,
        purchase_option_pct: match mode {
            FinancingMode::ResidualBalloon => dec!(20),
            FinancingMode::Amortizing => Decimal::ZERO,
        },
        insurance: InsuranceRates::default(),
        break_even_policy: BreakEvenPolicy::Simple,
        currency_decimals: 0,
        first_payment_date: None,
    }
}

#[test]
fn test_leasing_cheaper_monthly_than_credit() {
    let credit = simulate_scenario(&dashboard_defaults(FinancingMode::Amortizing)).unwrap();
    let leasing =
        simulate_scenario(&dashboard_defaults(FinancingMode::ResidualBalloon)).unwrap();
    assert!(leasing.result.monthly_payment < credit.result.monthly_payment);
    // 4,011,041 - 130 + 129,585 (insurance on the full property value)
    assert_eq!(leasing.result.monthly_payment, dec!(4_010_911) + dec!(129_585));
}

#[test]
fn test_scenario_first_month_signal_matches_schedule() {
    let out = simulate_scenario(&dashboard_defaults(FinancingMode::ResidualBalloon)).unwrap();
    let first = &out.result.schedule.rows[0];
    assert_eq!(out.result.first_month_signal, first.break_even_signal);
    assert_eq!(
        first.break_even_signal,
        dec!(3_000_000) - dec!(3_740_000) - dec!(129_585)
    );
}

#[test]
fn test_grid_crossing_agrees_with_direct_signal() {
    let input = BreakEvenGridInput {
        base: dashboard_defaults(FinancingMode::Amortizing),
        property_values: AxisRange {
            start: dec!(400_000_000),
            stop: dec!(410_000_000),
            step: dec!(10_000_000),
        },
        down_payments: AxisRange {
            start: dec!(0),
            stop: dec!(250_000_000),
            step: dec!(5_000_000),
        },
    };
    let out = break_even_grid(&input).unwrap();
    assert_eq!(out.result.zero_crossings.len(), 1);
    let crossing = &out.result.zero_crossings[0];

    // Signal is linear in the down payment between grid points, so a
    // scenario at the crossing has a first-month signal within a unit or two
    // of zero (interest rounding).
    let at_crossing = PropertyScenario {
        property_value: crossing.property_value,
        down_payment: crossing.down_payment,
        ..dashboard_defaults(FinancingMode::Amortizing)
    };
    let signal = simulate_scenario(&at_crossing).unwrap().result.first_month_signal;
    assert!(signal.abs() <= dec!(2), "signal at crossing {}", signal);
}

#[test]
fn test_profit_views_agree_on_first_month() {
    let scenario = dashboard_defaults(FinancingMode::Amortizing);
    let sweep = profit_by_down_payment(&DownPaymentSweepInput {
        scenario: scenario.clone(),
        min_down_payment: dec!(50_000_000),
        max_down_payment_fraction: dec!(0.8),
        points: 100,
    })
    .unwrap();
    let timeline = profit_timeline(&ProfitTimelineInput {
        scenario,
        annual_rent_growth_pct: dec!(4.0),
    })
    .unwrap();
    assert_eq!(
        sweep.result.points[0].monthly_profit,
        timeline.result.points[0].monthly_profit
    );
}

use loan_sim_core::amortization::{
    amortize, build_schedule, compute_fixed_payment, BreakEvenPolicy, FinancingMode,
    LoanParameters,
};
use loan_sim_core::LoanSimError;
use pretty_assertions::assert_eq;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

fn housing_credit() -> LoanParameters {
    LoanParameters {
        principal: dec!(480_000_000),
        monthly_rate: dec!(0.01),
        term_months: 240,
        residual_value: Decimal::ZERO,
        insurance_per_month: Decimal::ZERO,
        reference_value: Decimal::ZERO,
        mode: FinancingMode::Amortizing,
        break_even_policy: BreakEvenPolicy::Simple,
        currency_decimals: 0,
        first_payment_date: None,
    }
}

fn housing_leasing() -> LoanParameters {
    LoanParameters {
        principal: dec!(374_000_000),
        residual_value: dec!(106_000_000),
        insurance_per_month: dec!(129_585),
        reference_value: dec!(3_000_000),
        mode: FinancingMode::ResidualBalloon,
        ..housing_credit()
    }
}

// ===========================================================================
// Fixed payment
// ===========================================================================

#[test]
fn test_fixed_payment_matches_closed_form() {
    let f = dec!(1.01).powu(240);
    let expected = dec!(480_000_000) * dec!(0.01) * f / (f - Decimal::ONE);
    let pmt = compute_fixed_payment(dec!(480_000_000), dec!(0.01), 240, Decimal::ZERO).unwrap();
    assert!((pmt - expected).abs() < dec!(0.000001));
}

#[test]
fn test_fixed_payment_zero_rate_exact() {
    let pmt = compute_fixed_payment(dec!(100), Decimal::ZERO, 10, dec!(20)).unwrap();
    assert_eq!(pmt, dec!(8));
}

// ===========================================================================
// Schedule properties
// ===========================================================================

#[test]
fn test_row_count_and_months_for_various_terms() {
    for term in [1u32, 2, 12, 61, 360] {
        let params = LoanParameters {
            term_months: term,
            ..housing_credit()
        };
        let rows = build_schedule(&params).unwrap();
        let months: Vec<u32> = rows.iter().map(|r| r.month).collect();
        assert_eq!(months, (1..=term).collect::<Vec<_>>());
    }
}

#[test]
fn test_final_balance_is_contractual_target() {
    let credit = build_schedule(&housing_credit()).unwrap();
    assert_eq!(credit.last().unwrap().balance, Decimal::ZERO);

    let leasing = build_schedule(&housing_leasing()).unwrap();
    assert_eq!(leasing.last().unwrap().balance, dec!(106_000_000));
}

#[test]
fn test_interest_uses_previous_balance() {
    let rows = build_schedule(&housing_leasing()).unwrap();
    for pair in rows.windows(2).take(100) {
        let expected = (pair[0].balance * dec!(0.01)).round();
        assert_eq!(pair[1].interest, expected, "month {}", pair[1].month);
    }
}

#[test]
fn test_row_identity_payment_split() {
    let rows = build_schedule(&housing_leasing()).unwrap();
    for r in &rows {
        assert_eq!(r.interest + r.principal_portion + r.insurance, r.payment);
        assert_eq!(
            r.break_even_signal,
            dec!(3_000_000) - r.interest - dec!(129_585)
        );
    }
}

#[test]
fn test_totals_consistent_with_rows() {
    let out = amortize(&housing_leasing()).unwrap();
    let t = &out.result.totals;
    assert_eq!(t.total_paid, out.result.fixed_payment * dec!(240));
    assert_eq!(t.total_insurance, dec!(129_585) * dec!(240));
    assert_eq!(t.total_interest + t.total_principal + t.total_insurance, t.total_paid);
    // Principal repaid falls short of principal - residual by the drift
    assert_eq!(
        t.total_principal + t.final_balance_drift,
        dec!(374_000_000) - dec!(106_000_000)
    );
}

#[test]
fn test_envelope_metadata() {
    let out = amortize(&housing_credit()).unwrap();
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    assert!(out.methodology.contains("Amortizing"));
    assert_eq!(out.assumptions["term_months"], 240);
}

#[test]
fn test_schedule_serializes_rows() {
    let out = amortize(&housing_credit()).unwrap();
    let json = serde_json::to_value(&out).unwrap();
    let rows = json["result"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 240);
    assert_eq!(rows[0]["month"], 1);
    assert_eq!(rows[0]["interest"], "4800000");
    assert!(rows[0].get("payment_date").is_none());
}

#[test]
fn test_composite_and_simple_share_amortization() {
    let simple = LoanParameters {
        reference_value: dec!(6_000_000),
        ..housing_credit()
    };
    let composite = LoanParameters {
        break_even_policy: BreakEvenPolicy::Composite,
        ..simple.clone()
    };
    let a = build_schedule(&simple).unwrap();
    let b = build_schedule(&composite).unwrap();
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.interest, y.interest);
        assert_eq!(x.balance, y.balance);
    }
    assert_eq!(a[0].break_even_signal, dec!(1_200_000));
    assert_eq!(b[0].break_even_signal, dec!(30.9));
}

// ===========================================================================
// Errors
// ===========================================================================

#[test]
fn test_errors_before_any_row() {
    let cases = [
        (LoanParameters { term_months: 0, ..housing_credit() }, "term_months"),
        (LoanParameters { monthly_rate: dec!(-0.001), ..housing_credit() }, "monthly_rate"),
        (LoanParameters { insurance_per_month: dec!(-5), ..housing_credit() }, "insurance_per_month"),
        (
            LoanParameters { residual_value: dec!(400_000_000), ..housing_leasing() },
            "residual_value",
        ),
    ];
    for (params, expected_field) in cases {
        match build_schedule(&params) {
            Err(LoanSimError::InvalidParameter { field, .. }) => {
                assert_eq!(field, expected_field)
            }
            other => panic!("Expected InvalidParameter for {expected_field}, got {other:?}"),
        }
    }
}

#[test]
fn test_overflowing_rate_reports_overflow() {
    let params = LoanParameters {
        monthly_rate: dec!(25),
        term_months: 600,
        ..housing_credit()
    };
    assert!(matches!(
        build_schedule(&params),
        Err(LoanSimError::NumericOverflow(_))
    ));
}

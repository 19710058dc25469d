use napi::Result as NapiResult;
use napi_derive::napi;

use loan_sim_core::amortization::{self, LoanParameters};
use loan_sim_core::analysis::{profitability, scenario, sweep};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_fixed_payment(input_json: String) -> NapiResult<String> {
    let input: amortization::PaymentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::calculate_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let input: LoanParameters = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::amortize(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_scenario(input_json: String) -> NapiResult<String> {
    let input: scenario::PropertyScenario =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = scenario::simulate_scenario(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn break_even_grid(input_json: String) -> NapiResult<String> {
    let input: sweep::BreakEvenGridInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sweep::break_even_grid(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn profit_by_down_payment(input_json: String) -> NapiResult<String> {
    let input: profitability::DownPaymentSweepInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = profitability::profit_by_down_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn profit_timeline(input_json: String) -> NapiResult<String> {
    let input: profitability::ProfitTimelineInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = profitability::profit_timeline(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

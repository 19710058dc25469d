use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_sim_core::analysis::profitability::{
    self, DownPaymentSweepInput, ProfitTimelineInput,
};
use loan_sim_core::analysis::scenario::{self, InsuranceRates, PropertyScenario};
use loan_sim_core::analysis::sweep::{self, BreakEvenGridInput};

use crate::commands::amortization::{ModeArg, PolicyArg};
use crate::input;

/// Arguments for a property purchase scenario
#[derive(Args)]
pub struct ScenarioArgs {
    /// Property purchase price
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Cash paid up front
    #[arg(long, default_value = "0")]
    pub down_payment: Decimal,

    /// Nominal annual rate in percent (e.g. 12.0)
    #[arg(long)]
    pub annual_rate_pct: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub term_years: Option<u32>,

    /// Monthly market rent of an equivalent property
    #[arg(long, default_value = "0")]
    pub reference_rent: Decimal,

    /// Financing mode
    #[arg(long, value_enum, default_value = "amortizing")]
    pub mode: ModeArg,

    /// Leasing purchase option in percent of the property value
    #[arg(long, default_value = "0")]
    pub purchase_option_pct: Decimal,

    /// Break-even signal policy
    #[arg(long, value_enum, default_value = "simple")]
    pub policy: PolicyArg,

    /// Path to JSON input file (overrides flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the price x down-payment break-even grid
#[derive(Args)]
pub struct BreakEvenGridArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for profit across down payments
#[derive(Args)]
pub struct ProfitByDownPaymentArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for profit over time with rent indexation
#[derive(Args)]
pub struct ProfitTimelineArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the annual rent indexation in percent
    #[arg(long)]
    pub annual_rent_growth_pct: Option<Decimal>,
}

pub fn run_scenario(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario_input: PropertyScenario =
        if let Some(data) = input::file_or_stdin(args.input.as_deref())? {
            serde_json::from_value(data)?
        } else {
            PropertyScenario {
                property_value: args
                    .property_value
                    .ok_or("--property-value is required (or provide --input)")?,
                down_payment: args.down_payment,
                annual_rate_pct: args
                    .annual_rate_pct
                    .ok_or("--annual-rate-pct is required (or provide --input)")?,
                term_years: args
                    .term_years
                    .ok_or("--term-years is required (or provide --input)")?,
                reference_rent: args.reference_rent,
                mode: args.mode.into(),
                purchase_option_pct: args.purchase_option_pct,
                insurance: InsuranceRates::default(),
                break_even_policy: args.policy.into(),
                currency_decimals: 0,
                first_payment_date: None,
            }
        };
    let result = scenario::simulate_scenario(&scenario_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_break_even_grid(args: BreakEvenGridArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let grid_input: BreakEvenGridInput =
        if let Some(data) = input::file_or_stdin(args.input.as_deref())? {
            serde_json::from_value(data)?
        } else {
            return Err("--input <file.json> or stdin required for break-even grid".into());
        };
    let result = sweep::break_even_grid(&grid_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_profit_by_down_payment(
    args: ProfitByDownPaymentArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let sweep_input: DownPaymentSweepInput =
        if let Some(data) = input::file_or_stdin(args.input.as_deref())? {
            serde_json::from_value(data)?
        } else {
            return Err("--input <file.json> or stdin required for profit by down payment".into());
        };
    let result = profitability::profit_by_down_payment(&sweep_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_profit_timeline(args: ProfitTimelineArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut timeline_input: ProfitTimelineInput =
        if let Some(data) = input::file_or_stdin(args.input.as_deref())? {
            serde_json::from_value(data)?
        } else {
            return Err("--input <file.json> or stdin required for profit timeline".into());
        };
    if let Some(growth) = args.annual_rent_growth_pct {
        timeline_input.annual_rent_growth_pct = growth;
    }
    let result = profitability::profit_timeline(&timeline_input)?;
    Ok(serde_json::to_value(result)?)
}

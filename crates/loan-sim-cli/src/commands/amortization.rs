use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use loan_sim_core::amortization::{
    self, BreakEvenPolicy, FinancingMode, LoanParameters, PaymentInput,
};

use crate::input;

/// Financing structure selectable from the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Housing credit: balance paid down to zero
    Amortizing,
    /// Housing leasing: purchase option owed at term end
    ResidualBalloon,
}

impl From<ModeArg> for FinancingMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Amortizing => FinancingMode::Amortizing,
            ModeArg::ResidualBalloon => FinancingMode::ResidualBalloon,
        }
    }
}

/// Break-even signal formula
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    /// reference - interest - insurance
    Simple,
    /// FEC + 0.6 x FECap score
    Composite,
}

impl From<PolicyArg> for BreakEvenPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Simple => BreakEvenPolicy::Simple,
            PolicyArg::Composite => BreakEvenPolicy::Composite,
        }
    }
}

/// Arguments for the fixed payment formula
#[derive(Args)]
pub struct PaymentArgs {
    /// Amount financed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Monthly rate as a decimal (e.g. 0.01 for 1%)
    #[arg(long)]
    pub monthly_rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term_months: Option<u32>,

    /// Residual owed at term end (leasing purchase option)
    #[arg(long, default_value = "0")]
    pub residual: Decimal,

    /// Path to JSON input file with payment inputs (overrides flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a full amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Amount financed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Monthly rate as a decimal (e.g. 0.01 for 1%)
    #[arg(long)]
    pub monthly_rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term_months: Option<u32>,

    /// Residual owed at term end (ResidualBalloon only)
    #[arg(long, default_value = "0")]
    pub residual: Decimal,

    /// Fixed monthly insurance surcharge
    #[arg(long, default_value = "0")]
    pub insurance: Decimal,

    /// Reference monthly cost (market rent) for the break-even signal
    #[arg(long, default_value = "0")]
    pub reference: Decimal,

    /// Financing mode
    #[arg(long, value_enum, default_value = "amortizing")]
    pub mode: ModeArg,

    /// Break-even signal policy
    #[arg(long, value_enum, default_value = "simple")]
    pub policy: PolicyArg,

    /// Decimals of the smallest currency unit
    #[arg(long, default_value = "0")]
    pub currency_decimals: u32,

    /// Date of the first payment (YYYY-MM-DD)
    #[arg(long)]
    pub first_payment_date: Option<NaiveDate>,

    /// Path to JSON input file with loan parameters (overrides flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payment_input: PaymentInput =
        if let Some(data) = input::file_or_stdin(args.input.as_deref())? {
            serde_json::from_value(data)?
        } else {
            PaymentInput {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                monthly_rate: args
                    .monthly_rate
                    .ok_or("--monthly-rate is required (or provide --input)")?,
                term_months: args
                    .term_months
                    .ok_or("--term-months is required (or provide --input)")?,
                residual_value: args.residual,
            }
        };

    let result = amortization::calculate_payment(&payment_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: LoanParameters = if let Some(data) = input::file_or_stdin(args.input.as_deref())? {
        serde_json::from_value(data)?
    } else {
        LoanParameters {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            monthly_rate: args
                .monthly_rate
                .ok_or("--monthly-rate is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            residual_value: args.residual,
            insurance_per_month: args.insurance,
            reference_value: args.reference,
            mode: args.mode.into(),
            break_even_policy: args.policy.into(),
            currency_decimals: args.currency_decimals,
            first_payment_date: args.first_payment_date,
        }
    };

    let result = amortization::amortize(&params)?;
    Ok(serde_json::to_value(result)?)
}

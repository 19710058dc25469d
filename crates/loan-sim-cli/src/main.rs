mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortization::{PaymentArgs, ScheduleArgs};
use commands::analysis::{
    BreakEvenGridArgs, ProfitByDownPaymentArgs, ProfitTimelineArgs, ScenarioArgs,
};

/// Housing credit and leasing amortization simulator
#[derive(Parser)]
#[command(
    name = "loansim",
    version,
    about = "Housing credit and leasing amortization simulator",
    long_about = "Computes fixed monthly payments and month-by-month amortization \
                  schedules for housing credit and housing leasing with decimal \
                  precision, with a break-even signal against a reference rent, \
                  price x down-payment break-even grids and rent profitability."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Fixed monthly payment (annuity, optionally with a residual)
    Payment(PaymentArgs),
    /// Month-by-month amortization schedule with break-even signal
    Schedule(ScheduleArgs),
    /// Property purchase scenario (price, down payment, annual rate, years)
    Scenario(ScenarioArgs),
    /// First-month break-even signal over property price x down payment
    BreakEvenGrid(BreakEvenGridArgs),
    /// Monthly profit and annual return across down payments
    ProfitByDownPayment(ProfitByDownPaymentArgs),
    /// Monthly profit over the term with yearly rent indexation
    ProfitTimeline(ProfitTimelineArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::amortization::run_payment(args),
        Commands::Schedule(args) => commands::amortization::run_schedule(args),
        Commands::Scenario(args) => commands::analysis::run_scenario(args),
        Commands::BreakEvenGrid(args) => commands::analysis::run_break_even_grid(args),
        Commands::ProfitByDownPayment(args) => {
            commands::analysis::run_profit_by_down_payment(args)
        }
        Commands::ProfitTimeline(args) => commands::analysis::run_profit_timeline(args),
        Commands::Version => {
            println!("loansim {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

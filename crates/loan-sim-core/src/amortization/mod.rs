//! Fixed-payment amortization of housing loans and leasing contracts.
//!
//! `payment` holds the annuity formulas, `break_even` the selectable
//! break-even ("Sentido") policies and `schedule` the month-by-month
//! recurrence tying them together.

pub mod break_even;
pub mod payment;
pub mod schedule;

pub use break_even::BreakEvenPolicy;
pub use payment::{calculate_payment, compute_fixed_payment, PaymentInput, PaymentOutput};
pub use schedule::{
    amortize, build_schedule, AmortizationOutput, FinancingMode, LoanParameters, ScheduleRow,
};

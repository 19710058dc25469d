pub mod amortization;
pub mod analysis;

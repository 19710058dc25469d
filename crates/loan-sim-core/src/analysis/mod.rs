//! Dashboard-level analysis built on the amortization engine: property
//! scenarios, break-even grids and rent-versus-payment profitability.

pub mod profitability;
pub mod scenario;
pub mod sweep;

pub use scenario::{simulate_scenario, InsuranceRates, PropertyScenario};

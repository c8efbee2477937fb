//! Amortization engine, cost aggregation and ÅOP solver

mod aop;
mod costs;
mod engine;
mod schedule;
mod state;

pub use aop::{
    solve_aop, AopSolution, DERIVATIVE_FLOOR, INITIAL_MONTHLY_RATE, MAX_ITERATIONS, STEP_TOLERANCE,
};
pub use costs::{one_time_costs, OneTimeCosts};
pub use engine::{annuity_payment, AmortizationEngine};
pub use schedule::{write_schedule_csv, LoanAnalysisResult, LoanTotals, MonthlyBreakdown};
pub use state::AmortizationState;

/// Round a DKK amount to øre (2 decimals).
///
/// Every monthly figure is rounded before the next month is computed.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(10_000.004), 10_000.0);
        assert_eq!(round_to_cents(2_249.996), 2_250.0);
        assert_eq!(round_to_cents(-0.004), -0.0);
    }
}

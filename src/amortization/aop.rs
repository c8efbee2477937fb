//! ÅOP (Årlige Omkostninger i Procent) calculation
//!
//! Solves for the monthly rate `i` at which the payment stream discounts to
//! the cash the borrower actually received:
//!
//! `principal − one_time_costs = Σ payment_t / (1+i)^t`, t = 1..N
//!
//! using Newton-Raphson, then annualizes with `(1+i)^12 − 1`.

use log::{debug, warn};
use serde::Serialize;

/// Iteration budget for Newton-Raphson
pub const MAX_ITERATIONS: u32 = 200;

/// Stop once a Newton step is smaller than this
pub const STEP_TOLERANCE: f64 = 1e-10;

/// Stop when |f'(i)| falls below this
pub const DERIVATIVE_FLOOR: f64 = 1e-15;

/// Starting monthly rate (~5% annualized)
pub const INITIAL_MONTHLY_RATE: f64 = 0.004;

/// Result of an ÅOP solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AopSolution {
    /// Effective annual rate, rounded to 6 decimals
    pub annual_rate: f64,
    /// Monthly rate at the last iterate
    pub monthly_rate: f64,
    pub iterations: u32,
    /// False if the iteration budget ran out or the derivative vanished
    pub converged: bool,
}

/// Present value of `payments` at `monthly_rate` and its derivative
fn pv_and_derivative(payments: &[f64], monthly_rate: f64) -> (f64, f64) {
    let mut pv = 0.0;
    let mut dpv = 0.0;

    for (idx, &payment) in payments.iter().enumerate() {
        let t = (idx + 1) as i32;
        pv += payment / (1.0 + monthly_rate).powi(t);
        dpv -= t as f64 * payment / (1.0 + monthly_rate).powi(t + 1);
    }

    (pv, dpv)
}

/// Solve for the effective annual rate of a payment stream.
///
/// Best effort: when Newton-Raphson does not settle within
/// [`MAX_ITERATIONS`] the last iterate is returned with `converged = false`.
pub fn solve_aop(principal: f64, payments: &[f64], one_time_costs: f64) -> AopSolution {
    if payments.is_empty() {
        return AopSolution {
            annual_rate: 0.0,
            monthly_rate: 0.0,
            iterations: 0,
            converged: false,
        };
    }

    let net_received = principal - one_time_costs;
    let mut rate = INITIAL_MONTHLY_RATE;
    let mut converged = false;
    let mut iterations = 0;

    while iterations < MAX_ITERATIONS {
        iterations += 1;
        let (pv, dpv) = pv_and_derivative(payments, rate);

        if dpv.abs() < DERIVATIVE_FLOOR {
            warn!(
                "ÅOP solver: derivative vanished at monthly rate {:.8}, using last estimate",
                rate
            );
            break;
        }

        let step = (pv - net_received) / dpv;
        rate -= step;

        if step.abs() < STEP_TOLERANCE {
            converged = true;
            break;
        }
    }

    if !converged && iterations >= MAX_ITERATIONS {
        warn!(
            "ÅOP solver did not converge in {} iterations, using last estimate",
            MAX_ITERATIONS
        );
    }

    let annual = (1.0 + rate).powi(12) - 1.0;
    debug!(
        "ÅOP solved: monthly {:.8}, annual {:.6} after {} iterations",
        rate, annual, iterations
    );

    AopSolution {
        annual_rate: round_to(annual, 6),
        monthly_rate: rate,
        iterations,
        converged,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn level_payment(principal: f64, monthly_rate: f64, n: usize) -> f64 {
        principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powi(-(n as i32)))
    }

    #[test]
    fn test_recovers_coupon_without_costs() {
        // A plain annuity at 0.5%/month discounts to its principal at 0.5%/month
        let payment = level_payment(100_000.0, 0.005, 120);
        let payments = vec![payment; 120];

        let solution = solve_aop(100_000.0, &payments, 0.0);

        assert!(solution.converged);
        assert_abs_diff_eq!(solution.monthly_rate, 0.005, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.annual_rate, 1.005f64.powi(12) - 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_costs_raise_rate() {
        let payment = level_payment(100_000.0, 0.004, 240);
        let payments = vec![payment; 240];

        let without = solve_aop(100_000.0, &payments, 0.0);
        let with = solve_aop(100_000.0, &payments, 3_000.0);

        assert!(with.annual_rate > without.annual_rate);
    }

    #[test]
    fn test_rounded_to_six_decimals() {
        let payments = vec![1_000.0; 12];
        let solution = solve_aop(11_500.0, &payments, 0.0);

        let scaled = solution.annual_rate * 1e6;
        assert_abs_diff_eq!(scaled, scaled.round(), epsilon = 1e-6);
    }

    #[test]
    fn test_empty_payments() {
        let solution = solve_aop(100_000.0, &[], 0.0);
        assert_eq!(solution.annual_rate, 0.0);
        assert!(!solution.converged);
    }

    #[test]
    fn test_zero_payments_hits_derivative_floor() {
        let solution = solve_aop(100_000.0, &[0.0; 12], 0.0);
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 1);
        assert_abs_diff_eq!(solution.monthly_rate, INITIAL_MONTHLY_RATE);
    }

    #[test]
    fn test_iteration_budget_exhausted_without_root() {
        // Zero net proceeds against a single positive balloon: the present value only
        // reaches zero as the rate goes to infinity, so each step scales 1 + i by 13/12
        let mut payments = vec![0.0; 11];
        payments.push(1e90);

        let solution = solve_aop(1_000.0, &payments, 1_000.0);

        assert!(!solution.converged);
        assert_eq!(solution.iterations, MAX_ITERATIONS);
        assert!(solution.monthly_rate > INITIAL_MONTHLY_RATE);
        assert!(solution.monthly_rate.is_finite());
        assert!(solution.annual_rate.is_finite());
    }
}

//! Month-by-month amortization engine
//!
//! Bond interest and bidragssats are computed separately each month on the
//! opening balance. During the interest-only window the balance stays flat;
//! afterwards a fixed annuity, computed once on the ORIGINAL principal over
//! the remaining months, covers bond interest plus principal. Bidragssats is
//! charged on top of the annuity.

use super::aop::solve_aop;
use super::costs::one_time_costs;
use super::round_to_cents;
use super::schedule::{LoanAnalysisResult, LoanTotals, MonthlyBreakdown};
use super::state::AmortizationState;
use crate::loan::LoanConfiguration;
use crate::rates::RateTables;
use log::debug;

/// Standard annuity payment covering bond interest + principal.
///
/// Returns 0 when `principal` or `months` is 0; straight-line repayment when
/// the rate is exactly zero.
pub fn annuity_payment(principal: f64, annual_rate: f64, months: u32) -> f64 {
    if principal == 0.0 || months == 0 {
        return 0.0;
    }
    let r = annual_rate / 12.0;
    if r == 0.0 {
        return principal / months as f64;
    }
    principal * r / (1.0 - (1.0 + r).powi(-(months as i32)))
}

/// Amortization engine bound to a set of rate tables
pub struct AmortizationEngine<'r> {
    rates: &'r RateTables,
}

impl<'r> AmortizationEngine<'r> {
    pub fn new(rates: &'r RateTables) -> Self {
        Self { rates }
    }

    /// Build the full schedule, `term_years × 12` rows
    pub fn build_schedule(&self, config: &LoanConfiguration) -> Vec<MonthlyBreakdown> {
        let mut state = AmortizationState::from_config(config);
        let payment = annuity_payment(
            config.principal(),
            config.product().annual_rate,
            config.annuity_months(),
        );

        let mut schedule = Vec::with_capacity(config.total_months() as usize);
        for _ in 0..config.total_months() {
            state.advance_month();
            let (row, principal) = self.calculate_month(config, &state, payment);
            schedule.push(row);
            state.repay(principal);
        }

        debug!(
            "{} {}: {} months, fixed annuity {:.2}, closing balance {:.2}",
            config.institution(),
            config.product().id,
            schedule.len(),
            payment,
            state.balance,
        );

        schedule
    }

    /// Charges for the current month. Returns the rounded row and the
    /// unrounded principal used to roll the balance forward.
    fn calculate_month(
        &self,
        config: &LoanConfiguration,
        state: &AmortizationState,
        annuity_payment: f64,
    ) -> (MonthlyBreakdown, f64) {
        // Bracket is fixed at origination LTV for the life of the loan
        let fee_rate = config.bidragssats().effective_rate(config.ltv(), state.interest_only);
        let bidragssats = state.balance * fee_rate / 12.0;
        let bond_interest = state.balance * config.product().monthly_rate();

        let (principal, total_payment) = if state.interest_only {
            (0.0, bond_interest + bidragssats)
        } else {
            // Clamp guards against floating-point overshoot on the last payment
            let principal = (annuity_payment - bond_interest).min(state.balance);
            (principal, annuity_payment + bidragssats)
        };

        let row = MonthlyBreakdown {
            month: state.month,
            balance: state.balance,
            bond_interest: round_to_cents(bond_interest),
            bidragssats: round_to_cents(bidragssats),
            principal: round_to_cents(principal),
            total_payment: round_to_cents(total_payment),
        };

        (row, principal)
    }

    /// Schedule, lifetime totals, one-time costs and ÅOP for one configuration
    pub fn analyze(&self, config: &LoanConfiguration) -> LoanAnalysisResult {
        let schedule = self.build_schedule(config);
        let cost_breakdown =
            one_time_costs(config.principal(), config.market_price(), &self.rates.fees);
        let totals = LoanTotals::from_schedule(&schedule, cost_breakdown.total);

        let payments: Vec<f64> = schedule.iter().map(|r| r.total_payment).collect();
        let aop = solve_aop(config.principal(), &payments, cost_breakdown.total);

        LoanAnalysisResult {
            config: config.clone(),
            schedule,
            totals,
            cost_breakdown,
            aop: aop.annual_rate,
            aop_converged: aop.converged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::LoanRequest;
    use crate::rates::{BidragssatsEntry, BidragssatsSchedule, Institution, LoanProduct};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn request() -> LoanRequest {
        LoanRequest {
            property_value: 4_000_000.0,
            principal: 3_000_000.0,
            product: "fixed_30y".to_string(),
            term_years: 30,
            io_years: 0,
            institution: "Totalkredit".to_string(),
            market_price: None,
        }
    }

    fn config(rates: &RateTables, req: LoanRequest) -> LoanConfiguration {
        LoanConfiguration::new(req, rates).unwrap()
    }

    #[test]
    fn test_annuity_formula() {
        let p: f64 = 1_000_000.0;
        let r: f64 = 0.04 / 12.0;
        let n: i32 = 360;
        let expected = p * r / (1.0 - (1.0 + r).powi(-n));

        assert_abs_diff_eq!(annuity_payment(p, 0.04, 360), expected, epsilon = 0.01);
    }

    #[test]
    fn test_annuity_zero_rate_and_degenerate_inputs() {
        assert_abs_diff_eq!(annuity_payment(120_000.0, 0.0, 120), 1_000.0, epsilon = 1e-9);
        assert_eq!(annuity_payment(0.0, 0.04, 360), 0.0);
        assert_eq!(annuity_payment(100_000.0, 0.04, 0), 0.0);
    }

    #[test]
    fn test_schedule_length() {
        let rates = RateTables::february_2026();
        let engine = AmortizationEngine::new(&rates);

        let with_io = config(&rates, LoanRequest { io_years: 5, ..request() });
        assert_eq!(engine.build_schedule(&with_io).len(), 360);

        let short = config(&rates, LoanRequest { term_years: 20, ..request() });
        assert_eq!(engine.build_schedule(&short).len(), 240);
    }

    #[test]
    fn test_bidragssats_isolation() {
        let rates = RateTables::february_2026();
        let engine = AmortizationEngine::new(&rates);
        let cfg = config(&rates, request());
        let schedule = engine.build_schedule(&cfg);

        // Month 1 bond interest + principal is the annuity, without bidragssats
        let expected = annuity_payment(3_000_000.0, 0.04, 360);
        let row = &schedule[0];
        assert_abs_diff_eq!(row.bond_interest + row.principal, expected, epsilon = 1.0);
    }

    #[test]
    fn test_interest_only_balance_unchanged() {
        let rates = RateTables::february_2026();
        let engine = AmortizationEngine::new(&rates);
        let cfg = config(&rates, LoanRequest { io_years: 5, ..request() });
        let schedule = engine.build_schedule(&cfg);

        for row in &schedule[..60] {
            assert_eq!(row.principal, 0.0);
            assert_eq!(row.balance, 3_000_000.0);
            assert_abs_diff_eq!(
                row.total_payment,
                row.bond_interest + row.bidragssats,
                epsilon = 0.011
            );
        }
        assert_relative_eq!(schedule[60].balance, 3_000_000.0, max_relative = 1e-4);
        assert!(schedule[60].principal > 0.0);
    }

    #[test]
    fn test_io_premium_charged_only_during_io() {
        let rates = RateTables::february_2026();
        let engine = AmortizationEngine::new(&rates);
        let cfg = config(&rates, LoanRequest { io_years: 5, ..request() });
        let schedule = engine.build_schedule(&cfg);

        // 0.90% + 0.10% premium on 3M during IO, 0.90% once amortizing
        assert_abs_diff_eq!(schedule[0].bidragssats, 2_500.0, epsilon = 0.01);
        assert_abs_diff_eq!(schedule[60].bidragssats, 2_250.0, epsilon = 0.01);
    }

    #[test]
    fn test_balance_strictly_decreases_after_io() {
        let rates = RateTables::february_2026();
        let engine = AmortizationEngine::new(&rates);
        let cfg = config(&rates, LoanRequest { io_years: 3, ..request() });
        let schedule = engine.build_schedule(&cfg);

        for pair in schedule[36..].windows(2) {
            assert!(pair[1].balance < pair[0].balance, "month {}", pair[1].month);
        }
    }

    #[test]
    fn test_full_amortization() {
        let rates = RateTables::february_2026();
        let engine = AmortizationEngine::new(&rates);
        let cfg = config(&rates, request());
        let schedule = engine.build_schedule(&cfg);

        let repaid: f64 = schedule.iter().map(|r| r.principal).sum();
        assert_abs_diff_eq!(repaid, 3_000_000.0, epsilon = 5.0);
    }

    #[test]
    fn test_full_amortization_with_io() {
        let rates = RateTables::february_2026();
        let engine = AmortizationEngine::new(&rates);
        let cfg = config(
            &rates,
            LoanRequest { io_years: 10, product: "F3".to_string(), ..request() },
        );
        let schedule = engine.build_schedule(&cfg);

        let repaid: f64 = schedule.iter().map(|r| r.principal).sum();
        assert_abs_diff_eq!(repaid, 3_000_000.0, epsilon = 5.0);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let rates = RateTables::february_2026();
        let engine = AmortizationEngine::new(&rates);
        let cfg = config(&rates, LoanRequest { market_price: Some(98.0), ..request() });
        let result = engine.analyze(&cfg);

        assert_eq!(result.schedule.len(), 360);
        assert_abs_diff_eq!(result.schedule[0].bond_interest, 10_000.0, epsilon = 0.01);
        assert_abs_diff_eq!(result.schedule[0].bidragssats, 2_250.0, epsilon = 0.01);
        assert_abs_diff_eq!(result.totals.principal, 3_000_000.0, epsilon = 5.0);
        assert_abs_diff_eq!(result.one_time_costs(), 125_350.0, epsilon = 0.01);
        assert!(result.aop > 0.04 && result.aop < 0.07, "ÅOP {} outside 4-7%", result.aop);
        assert!(result.aop_converged);
    }

    #[test]
    fn test_lifetime_cost_is_sum_of_totals() {
        let rates = RateTables::february_2026();
        let engine = AmortizationEngine::new(&rates);
        let result = engine.analyze(&config(&rates, request()));
        let t = result.totals;

        assert_abs_diff_eq!(
            t.lifetime_cost,
            t.bond_interest + t.bidragssats + t.principal + t.one_time_costs,
            epsilon = 0.05
        );
    }

    #[test]
    fn test_synthetic_zero_rate_tables() {
        let mut rates = RateTables::february_2026();
        rates.products = vec![LoanProduct::new("free", 0.0, 100.0)];
        let flat = BidragssatsEntry::new(0.0, 0.0);
        rates.institutions = vec![Institution::new(
            "Zero",
            BidragssatsSchedule { low: flat, mid: flat, high: flat },
        )];

        let engine = AmortizationEngine::new(&rates);
        let cfg = config(
            &rates,
            LoanRequest {
                principal: 120_000.0,
                property_value: 200_000.0,
                product: "free".to_string(),
                term_years: 10,
                institution: "Zero".to_string(),
                ..request()
            },
        );
        let schedule = engine.build_schedule(&cfg);

        assert!(schedule.iter().all(|r| r.bond_interest == 0.0 && r.bidragssats == 0.0));
        assert!(schedule.iter().all(|r| r.principal == 1_000.0));
        assert_eq!(schedule.last().map(|r| r.balance), Some(1_000.0));
    }
}

//! Schedule output structures for loan analyses

use super::costs::OneTimeCosts;
use super::round_to_cents;
use crate::loan::LoanConfiguration;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::io::Write;

/// One month of the amortization schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBreakdown {
    /// Month index (1-based)
    pub month: u32,
    /// Outstanding principal at start of month
    pub balance: f64,
    /// Bond coupon interest (tax-deductible)
    pub bond_interest: f64,
    /// Contribution fee (not tax-deductible)
    pub bidragssats: f64,
    /// Principal repaid (0 during interest-only)
    pub principal: f64,
    /// Total payment for the month
    pub total_payment: f64,
}

/// Lifetime sums over a schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTotals {
    pub bond_interest: f64,
    pub bidragssats: f64,
    /// Should equal the principal borrowed within rounding
    pub principal: f64,
    pub one_time_costs: f64,
    /// bond interest + bidragssats + principal + one-time costs
    pub lifetime_cost: f64,
}

impl LoanTotals {
    pub fn from_schedule(schedule: &[MonthlyBreakdown], one_time_costs: f64) -> Self {
        let bond_interest: f64 = schedule.iter().map(|r| r.bond_interest).sum();
        let bidragssats: f64 = schedule.iter().map(|r| r.bidragssats).sum();
        let principal: f64 = schedule.iter().map(|r| r.principal).sum();
        let lifetime_cost = bond_interest + bidragssats + principal + one_time_costs;

        Self {
            bond_interest: round_to_cents(bond_interest),
            bidragssats: round_to_cents(bidragssats),
            principal: round_to_cents(principal),
            one_time_costs: round_to_cents(one_time_costs),
            lifetime_cost: round_to_cents(lifetime_cost),
        }
    }
}

/// Complete analysis of one loan configuration
#[derive(Debug, Clone, Serialize)]
pub struct LoanAnalysisResult {
    pub config: LoanConfiguration,
    pub schedule: Vec<MonthlyBreakdown>,
    pub totals: LoanTotals,
    /// Itemised origination costs
    pub cost_breakdown: OneTimeCosts,
    /// Effective annual cost rate (ÅOP), rounded to 6 decimals
    pub aop: f64,
    /// False when the ÅOP solver stopped before reaching its tolerance
    pub aop_converged: bool,
}

impl LoanAnalysisResult {
    pub fn lifetime_cost(&self) -> f64 {
        self.totals.lifetime_cost
    }

    pub fn one_time_costs(&self) -> f64 {
        self.totals.one_time_costs
    }

    /// Total payment in month 1
    pub fn first_payment(&self) -> f64 {
        self.schedule.first().map(|r| r.total_payment).unwrap_or(0.0)
    }

    /// Rows belonging to loan year `year` (1-based); empty outside the term
    pub fn year_rows(&self, year: u32) -> &[MonthlyBreakdown] {
        if year == 0 {
            return &[];
        }
        let start = ((year - 1) * 12) as usize;
        let end = (year * 12) as usize;
        if start >= self.schedule.len() {
            return &[];
        }
        &self.schedule[start..end.min(self.schedule.len())]
    }
}

/// Write a schedule as CSV with a header row
pub fn write_schedule_csv<W: Write>(
    writer: W,
    schedule: &[MonthlyBreakdown],
) -> Result<(), Box<dyn Error>> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in schedule {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(month: u32, bond_interest: f64, bidragssats: f64, principal: f64) -> MonthlyBreakdown {
        MonthlyBreakdown {
            month,
            balance: 0.0,
            bond_interest,
            bidragssats,
            principal,
            total_payment: bond_interest + bidragssats + principal,
        }
    }

    #[test]
    fn test_totals_sum_columns() {
        let schedule = vec![row(1, 100.0, 20.0, 500.0), row(2, 98.33, 19.67, 501.67)];
        let totals = LoanTotals::from_schedule(&schedule, 1_000.0);

        assert_eq!(totals.bond_interest, 198.33);
        assert_eq!(totals.bidragssats, 39.67);
        assert_eq!(totals.principal, 1_001.67);
        assert_eq!(totals.lifetime_cost, 2_239.67);
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let schedule = vec![row(1, 100.0, 20.0, 500.0), row(2, 99.0, 19.0, 501.0)];
        let mut buffer = Vec::new();
        write_schedule_csv(&mut buffer, &schedule).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "month,balance,bond_interest,bidragssats,principal,total_payment");
        assert!(lines[1].starts_with("1,"));
    }
}
